use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use crate::bootstrap::runner::Invocation;
use crate::manager::BinaryLookup;

/// Location of the PBS configuration file that defines `PBS_EXEC`.
pub const PBS_CONF_PATH: &str = "/etc/pbs.conf";

/// Installation prefix used by PBS when `PBS_EXEC` is not known.
const DEFAULT_PBS_EXEC: &str = "/opt/pbs";

const QMGR_BINARY: &str = "qmgr";

/// A single administrative directive passed to `qmgr -c`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QmgrDirective {
    CreateNode {
        name: String,
    },
    SetNodeAttribute {
        node: String,
        attribute: String,
        value: String,
    },
    SetServerAttribute {
        attribute: String,
        value: String,
    },
    ListNode {
        name: String,
    },
}

impl QmgrDirective {
    pub fn invocation(&self, qmgr: &Path) -> Invocation {
        Invocation::new(qmgr.display().to_string()).args(["-c".to_string(), self.to_string()])
    }
}

/// Double-quotes attribute values that `qmgr` would otherwise split or misread.
fn quote_value(value: &str) -> Cow<'_, str> {
    if value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '=' | ',' | '#'))
    {
        Cow::Owned(format!("\"{value}\""))
    } else {
        Cow::Borrowed(value)
    }
}

impl Display for QmgrDirective {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QmgrDirective::CreateNode { name } => write!(f, "create node {name}"),
            QmgrDirective::SetNodeAttribute {
                node,
                attribute,
                value,
            } => write!(f, "set node {node} {attribute}={}", quote_value(value)),
            QmgrDirective::SetServerAttribute { attribute, value } => {
                write!(f, "set server {attribute}={}", quote_value(value))
            }
            QmgrDirective::ListNode { name } => write!(f, "list node {name}"),
        }
    }
}

/// Reads `KEY=VALUE` pairs from the contents of `pbs.conf`.
pub fn parse_pbs_conf(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Returns the PBS installation prefix from the environment or from `pbs.conf`.
pub fn find_pbs_exec() -> Option<PathBuf> {
    if let Some(exec) = std::env::var_os("PBS_EXEC") {
        return Some(PathBuf::from(exec));
    }
    match std::fs::read_to_string(PBS_CONF_PATH) {
        Ok(contents) => parse_pbs_conf(&contents)
            .into_iter()
            .find(|(key, _)| key == "PBS_EXEC")
            .map(|(_, value)| PathBuf::from(value)),
        Err(error) => {
            log::debug!("Cannot read {PBS_CONF_PATH}: {error}");
            None
        }
    }
}

/// Decides which `qmgr` binary will be executed.
///
/// An explicitly configured path always wins. Otherwise `qmgr` is searched in `PATH`,
/// then in `<PBS_EXEC>/bin`. If nothing is found, the default PBS location is used
/// and the failure will surface when the command is spawned.
pub fn resolve_qmgr_path(
    configured: Option<&Path>,
    lookup: &dyn BinaryLookup,
    pbs_exec: Option<&Path>,
) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    if let Some(path) = lookup.find(QMGR_BINARY) {
        return path;
    }
    if let Some(exec) = pbs_exec {
        let path = exec.join("bin").join(QMGR_BINARY);
        if path.is_file() {
            return path;
        }
        log::debug!("{} does not exist", path.display());
    }
    let path = Path::new(DEFAULT_PBS_EXEC).join("bin").join(QMGR_BINARY);
    log::warn!(
        "Cannot find `{QMGR_BINARY}` in PATH or PBS_EXEC, falling back to {}",
        path.display()
    );
    path
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use crate::manager::qmgr::{QmgrDirective, parse_pbs_conf, resolve_qmgr_path};
    use crate::tests::utils::{FakeLookup, strings};

    #[test]
    fn test_render_directives() {
        let create = QmgrDirective::CreateNode {
            name: "pbs".to_string(),
        };
        let assign = QmgrDirective::SetNodeAttribute {
            node: "pbs".to_string(),
            attribute: "queue".to_string(),
            value: "workq".to_string(),
        };
        let history = QmgrDirective::SetServerAttribute {
            attribute: "job_history_enable".to_string(),
            value: "True".to_string(),
        };
        let list = QmgrDirective::ListNode {
            name: "pbs".to_string(),
        };
        assert_eq!(create.to_string(), "create node pbs");
        assert_eq!(assign.to_string(), "set node pbs queue=workq");
        assert_eq!(history.to_string(), "set server job_history_enable=True");
        assert_eq!(list.to_string(), "list node pbs");
    }

    #[test]
    fn test_render_quoted_values() {
        let comment = QmgrDirective::SetServerAttribute {
            attribute: "comment".to_string(),
            value: "my cluster".to_string(),
        };
        let acl = QmgrDirective::SetServerAttribute {
            attribute: "managers".to_string(),
            value: "root@head,admin@head".to_string(),
        };
        let duration = QmgrDirective::SetServerAttribute {
            attribute: "job_history_duration".to_string(),
            value: "72:00:00".to_string(),
        };
        assert_eq!(comment.to_string(), r#"set server comment="my cluster""#);
        assert_eq!(acl.to_string(), r#"set server managers="root@head,admin@head""#);
        assert_eq!(duration.to_string(), "set server job_history_duration=72:00:00");
        assert_eq!(
            comment.invocation(Path::new("qmgr")).args,
            strings(&["-c", r#"set server comment="my cluster""#])
        );
    }

    #[test]
    fn test_directive_invocation() {
        let invocation = QmgrDirective::CreateNode {
            name: "pbs".to_string(),
        }
        .invocation(Path::new("/opt/pbs/bin/qmgr"));
        assert_eq!(invocation.program, "/opt/pbs/bin/qmgr");
        assert_eq!(invocation.args, strings(&["-c", "create node pbs"]));
    }

    #[test]
    fn test_parse_pbs_conf() {
        let conf = r#"
# PBS configuration
PBS_EXEC=/opt/pbs
PBS_SERVER = pbs
PBS_START_MOM=1

garbage line
"#;
        assert_eq!(
            parse_pbs_conf(conf),
            vec![
                ("PBS_EXEC".to_string(), "/opt/pbs".to_string()),
                ("PBS_SERVER".to_string(), "pbs".to_string()),
                ("PBS_START_MOM".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_configured_path_wins() {
        let lookup = FakeLookup::new(&["qmgr"]);
        let path = resolve_qmgr_path(Some(Path::new("/custom/qmgr")), &lookup, None);
        assert_eq!(path, PathBuf::from("/custom/qmgr"));
    }

    #[test]
    fn test_resolve_from_path() {
        let lookup = FakeLookup::new(&["qmgr"]);
        let path = resolve_qmgr_path(None, &lookup, Some(Path::new("/nonexistent")));
        assert_eq!(path, PathBuf::from("/usr/bin/qmgr"));
    }

    #[test]
    fn test_resolve_from_pbs_exec() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        std::fs::write(dir.path().join("bin").join("qmgr"), "").unwrap();

        let lookup = FakeLookup::new(&[]);
        let path = resolve_qmgr_path(None, &lookup, Some(dir.path()));
        assert_eq!(path, dir.path().join("bin").join("qmgr"));
    }

    #[test]
    fn test_resolve_fallback() {
        let lookup = FakeLookup::new(&[]);
        let path = resolve_qmgr_path(None, &lookup, Some(Path::new("/nonexistent")));
        assert_eq!(path, PathBuf::from("/opt/pbs/bin/qmgr"));
    }
}
