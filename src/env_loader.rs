use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(worklog_home: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(dir) = worklog_home {
        return Some(dir.join(".env"));
    }
    Some(home_dir?.join(".worklog/.env"))
}

/// `.env` in the working directory wins; otherwise the one under the worklog home.
pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("WORKLOG_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}
