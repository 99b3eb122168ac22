use crate::command::ExitCode;
use crate::env::Environment;
use nix::unistd::{Uid, User, gethostname};
use std::path::Path;

/// Builds the interactive prompt for the current state of `env`.
pub fn render(env: &Environment) -> String {
    let user = env
        .get_var("USER")
        .filter(|name| !name.is_empty())
        .or_else(|| {
            User::from_uid(Uid::current())
                .ok()
                .flatten()
                .map(|user| user.name)
        })
        .unwrap_or_else(|| "?".to_string());
    let host = gethostname()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string());
    let cwd = collapse_home(&env.current_dir, env.home_dir().as_deref());
    format_prompt(&user, &host, &cwd, env.last_status)
}

/// `user@host:cwd $ ` after success, `user@host:cwd <status>! ` otherwise.
pub fn format_prompt(user: &str, host: &str, cwd: &str, last_status: ExitCode) -> String {
    if last_status == 0 {
        format!("{user}@{host}:{cwd} $ ")
    } else {
        format!("{user}@{host}:{cwd} {last_status}! ")
    }
}

/// Replaces a leading home directory with `~`.
pub fn collapse_home(cwd: &Path, home: Option<&Path>) -> String {
    match home.and_then(|home| cwd.strip_prefix(home).ok()) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~/{}", rest.display()),
        None => cwd.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn test_collapse_home() {
        let home = Path::new("/home/alice");
        assert_eq!(collapse_home(Path::new("/home/alice"), Some(home)), "~");
        assert_eq!(
            collapse_home(Path::new("/home/alice/src/x"), Some(home)),
            "~/src/x"
        );
        assert_eq!(collapse_home(Path::new("/home/alicex"), Some(home)), "/home/alicex");
        assert_eq!(collapse_home(Path::new("/tmp"), Some(home)), "/tmp");
        assert_eq!(collapse_home(Path::new("/tmp"), None), "/tmp");
    }

    #[test]
    fn test_prompt_marks_failed_status() {
        assert_eq!(format_prompt("u", "h", "~", 0), "u@h:~ $ ");
        assert_eq!(format_prompt("u", "h", "/tmp", 2), "u@h:/tmp 2! ");
    }

    #[test]
    fn test_render_uses_environment() {
        let mut vars = HashMap::new();
        vars.insert("USER".to_string(), "tester".to_string());
        vars.insert("HOME".to_string(), "/home/tester".to_string());
        let env = Environment {
            vars,
            current_dir: PathBuf::from("/home/tester/work"),
            should_exit: false,
            last_status: 1,
        };

        let prompt = render(&env);
        assert!(prompt.starts_with("tester@"));
        assert!(prompt.ends_with(":~/work 1! "));
    }
}
