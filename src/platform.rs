// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: platform  -  export platform capability table
// ─────────────────────────────────────────────────────────────────────────────

use std::fmt;
use std::str::FromStr;

/// Export targets the IDE knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Platform {
    Windows,
    Mac,
    Linux,
    Ios,
    Android,
    Ps4,
    #[value(name = "xboxone")]
    XboxOne,
    Switch,
    Html5,
    Uwp,
}

impl Platform {
    pub const ALL: [Platform; 10] = [
        Platform::Windows, Platform::Mac, Platform::Linux, Platform::Ios,
        Platform::Android, Platform::Ps4, Platform::XboxOne, Platform::Switch,
        Platform::Html5, Platform::Uwp,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Mac     => "mac",
            Platform::Linux   => "linux",
            Platform::Ios     => "ios",
            Platform::Android => "android",
            Platform::Ps4     => "ps4",
            Platform::XboxOne => "xboxone",
            Platform::Switch  => "switch",
            Platform::Html5   => "html5",
            Platform::Uwp     => "uwp",
        }
    }

    /// Capability entry, or the unsupported sentinel.
    pub fn capability(self) -> &'static PlatformCapability {
        CAPABILITIES.iter()
            .find(|c| c.platform == Some(self))
            .unwrap_or(&UNSUPPORTED)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL.iter()
            .copied()
            .find(|p| p.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown platform '{s}'"))
    }
}

/// Fixed facts the compiler needs per platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformCapability {
    pub platform:  Option<Platform>,
    /// Compiler component name, e.g. "Windows".
    pub component: &'static str,
    /// Licence key gating the component, e.g. "Windows.build_module".
    pub build_module: &'static str,
    /// Needs a remote build client (and so a device config entry).
    pub requires_remote_client: bool,
    /// Only packaging is possible; running has to happen elsewhere (Xcode).
    pub package_only: bool,
    /// Export action used for archive builds.
    pub package_key: &'static str,
}

impl PlatformCapability {
    pub fn is_supported(&self) -> bool {
        self.platform.is_some()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
//  Static capability table
// ─────────────────────────────────────────────────────────────────────────────

pub static UNSUPPORTED: PlatformCapability = PlatformCapability {
    platform: None,
    component: "Unsupported",
    build_module: "",
    requires_remote_client: false,
    package_only: false,
    package_key: "Package",
};

static CAPABILITIES: &[PlatformCapability] = &[
    PlatformCapability {
        platform: Some(Platform::Windows),
        component: "Windows", build_module: "Windows.build_module",
        requires_remote_client: false, package_only: false,
        package_key: "PackageZip",
    },
    PlatformCapability {
        platform: Some(Platform::Mac),
        component: "Mac", build_module: "Mac.build_module",
        requires_remote_client: true, package_only: false,
        package_key: "Package",
    },
    PlatformCapability {
        platform: Some(Platform::Linux),
        component: "Linux", build_module: "Linux.build_module",
        requires_remote_client: true, package_only: false,
        package_key: "Package",
    },
    PlatformCapability {
        platform: Some(Platform::Ios),
        component: "iOS", build_module: "ios.build_module",
        requires_remote_client: true, package_only: true,
        package_key: "Package",
    },
    PlatformCapability {
        platform: Some(Platform::Android),
        component: "Android", build_module: "android.build_module",
        requires_remote_client: false, package_only: false,
        package_key: "Package",
    },
    PlatformCapability {
        platform: Some(Platform::Switch),
        component: "Switch", build_module: "switch.build_module",
        requires_remote_client: false, package_only: false,
        package_key: "Package",
    },
];
