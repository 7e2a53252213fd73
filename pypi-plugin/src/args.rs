//! `twine upload` argument assembly.

use crate::config::UploadConfig;

/// Upload tool invoked for real runs
pub const TWINE_COMMAND: &str = "twine";

const PASSWORD_FLAG: &str = "-p";

/// Build the `twine` argument list for `cfg`.
///
/// The order is fixed: `upload --repository-url <url> -u <user> -p <password>
/// [--skip-existing] <dist_path>`. The dist path is always last.
pub fn build_twine_args(cfg: &UploadConfig) -> Vec<String> {
    let mut args = vec![
        "upload".to_string(),
        "--repository-url".to_string(),
        cfg.repository.clone(),
        "-u".to_string(),
        cfg.username.clone(),
        PASSWORD_FLAG.to_string(),
        cfg.password.clone(),
    ];

    if cfg.skip_existing {
        args.push("--skip-existing".to_string());
    }

    args.push(cfg.dist_path.clone());
    args
}

/// Render a command line for logs with the password value masked.
pub fn redacted_command_line(command: &str, args: &[String]) -> String {
    let mut rendered = vec![command.to_string()];
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            rendered.push("****".to_string());
            mask_next = false;
        } else {
            mask_next = arg == PASSWORD_FLAG;
            rendered.push(arg.clone());
        }
    }
    rendered.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(skip_existing: bool) -> UploadConfig {
        UploadConfig {
            username: "user".into(),
            password: "pass".into(),
            skip_existing,
            ..UploadConfig::default()
        }
    }

    #[test]
    fn test_basic_args() {
        assert_eq!(
            build_twine_args(&config(false)),
            [
                "upload",
                "--repository-url",
                "https://upload.pypi.org/legacy/",
                "-u",
                "user",
                "-p",
                "pass",
                "dist/*",
            ]
        );
    }

    #[test]
    fn test_skip_existing_sits_right_before_path() {
        let args = build_twine_args(&config(true));
        let positions: Vec<usize> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "--skip-existing")
            .map(|(i, _)| i)
            .collect();

        assert_eq!(positions, [args.len() - 2]);
        assert_eq!(args.last().map(String::as_str), Some("dist/*"));
    }

    #[test]
    fn test_custom_repository_and_path() {
        let cfg = UploadConfig {
            username: "testuser".into(),
            password: "testpass".into(),
            repository: "https://test.pypi.org/legacy/".into(),
            dist_path: "build/dist/*.whl".into(),
            skip_existing: false,
        };
        let args = build_twine_args(&cfg);
        assert_eq!(args[2], "https://test.pypi.org/legacy/");
        assert_eq!(args[4], "testuser");
        assert_eq!(args[6], "testpass");
        assert_eq!(args[7], "build/dist/*.whl");
        assert_eq!(args.len(), 8);
    }

    #[test]
    fn test_redacted_command_line_hides_password() {
        let line = redacted_command_line(TWINE_COMMAND, &build_twine_args(&config(true)));
        assert_eq!(
            line,
            "twine upload --repository-url https://upload.pypi.org/legacy/ -u user -p **** --skip-existing dist/*"
        );
    }
}
