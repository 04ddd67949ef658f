use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::bootstrap::runner::Invocation;
use crate::common::error::NodeBootError;
use crate::manager::BinaryLookup;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PackageManager {
    Dnf,
    Yum,
    Apt,
    Zypper,
}

/// Order in which package managers are tried during detection.
const DETECTION_ORDER: [PackageManager; 4] = [
    PackageManager::Dnf,
    PackageManager::Yum,
    PackageManager::Apt,
    PackageManager::Zypper,
];

impl PackageManager {
    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Apt => "apt-get",
            PackageManager::Zypper => "zypper",
        }
    }

    /// Finds the first package manager available on this host.
    pub fn detect(lookup: &dyn BinaryLookup) -> crate::Result<PackageManager> {
        for manager in DETECTION_ORDER {
            if let Some(path) = lookup.find(manager.program()) {
                log::debug!("Detected package manager {manager} at {}", path.display());
                return Ok(manager);
            }
        }
        Err(Self::not_found())
    }

    /// Error reported when none of the supported package managers is available.
    pub fn not_found() -> NodeBootError {
        NodeBootError::NoPackageManager(
            DETECTION_ORDER
                .iter()
                .map(|m| m.program())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// Name under which this package manager ships `package`.
    pub fn package_name<'a>(&self, package: &'a str) -> &'a str {
        match (self, package) {
            // Debian and Ubuntu ship `which` as part of debianutils
            (PackageManager::Apt, "which") => "debianutils",
            _ => package,
        }
    }

    /// Creates a non-interactive command that installs the given packages.
    pub fn install_invocation(&self, packages: &[String]) -> Invocation {
        let args: Vec<&str> = match self {
            PackageManager::Dnf | PackageManager::Yum | PackageManager::Apt => {
                vec!["install", "-y"]
            }
            PackageManager::Zypper => vec!["--non-interactive", "install"],
        };
        let mut invocation = Invocation::new(self.program())
            .args(args)
            .args(packages.iter().map(|package| self.package_name(package)));
        if let PackageManager::Apt = self {
            invocation = invocation.env("DEBIAN_FRONTEND", "noninteractive");
        }
        invocation
    }
}

impl Display for PackageManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.program())
    }
}

#[cfg(test)]
mod tests {
    use crate::common::error::NodeBootError;
    use crate::manager::package::PackageManager;
    use crate::tests::utils::{FakeLookup, strings};

    #[test]
    fn test_detect_prefers_dnf() {
        let lookup = FakeLookup::new(&["yum", "dnf"]);
        assert_eq!(PackageManager::detect(&lookup).unwrap(), PackageManager::Dnf);
    }

    #[test]
    fn test_detect_apt() {
        let lookup = FakeLookup::new(&["apt-get", "zypper"]);
        assert_eq!(PackageManager::detect(&lookup).unwrap(), PackageManager::Apt);
    }

    #[test]
    fn test_detect_nothing() {
        let lookup = FakeLookup::new(&[]);
        match PackageManager::detect(&lookup) {
            Err(NodeBootError::NoPackageManager(tried)) => {
                assert_eq!(tried, "dnf, yum, apt-get, zypper")
            }
            other => panic!("Unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_install_yum() {
        let invocation = PackageManager::Yum.install_invocation(&strings(&["which", "python3"]));
        assert_eq!(invocation.program, "yum");
        assert_eq!(invocation.args, strings(&["install", "-y", "which", "python3"]));
        assert!(invocation.env.is_empty());
    }

    #[test]
    fn test_install_apt_is_noninteractive() {
        let invocation = PackageManager::Apt.install_invocation(&strings(&["python3"]));
        assert_eq!(invocation.program, "apt-get");
        assert_eq!(invocation.args, strings(&["install", "-y", "python3"]));
        assert_eq!(
            invocation.env,
            vec![("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())]
        );
    }

    #[test]
    fn test_install_apt_maps_which() {
        let invocation = PackageManager::Apt.install_invocation(&strings(&["which", "python3"]));
        assert_eq!(
            invocation.args,
            strings(&["install", "-y", "debianutils", "python3"])
        );
    }

    #[test]
    fn test_package_names_of_other_managers() {
        for manager in [
            PackageManager::Dnf,
            PackageManager::Yum,
            PackageManager::Zypper,
        ] {
            assert_eq!(manager.package_name("which"), "which");
            assert_eq!(manager.package_name("python3"), "python3");
        }
    }

    #[test]
    fn test_install_zypper() {
        let invocation = PackageManager::Zypper.install_invocation(&strings(&["which"]));
        assert_eq!(
            invocation.args,
            strings(&["--non-interactive", "install", "which"])
        );
    }
}
