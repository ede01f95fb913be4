//! The fixed set of SDK library builds and the shell script for each.

use std::path::Path;

use crate::config::FleetConfig;
use crate::error::CatalogError;
use crate::job::{Job, JobCatalog};
use crate::runner::ShellBuild;

/// One SDK library configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTarget {
    pub qt: &'static str,
    pub os: &'static str,
    pub device: &'static str,
    pub build_type: &'static str,
}

impl BuildTarget {
    /// Directory under `build/`, also used as the job name.
    pub fn build_dir(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.device,
            self.os,
            self.qt,
            self.build_type.to_lowercase()
        )
    }

    /// Toolchain file shipped in `lib/cmake/mrs-sdk-qt/toolchains`.
    pub fn toolchain_file(&self) -> String {
        format!("{}-{}.cmake", self.qt, self.os)
    }
}

const BUILD_TYPES: [&str; 1] = ["debug"];

// Order is the display order and must stay stable.
const TARGETS: [(&str, &str, &str); 5] = [
    ("qt5", "yocto", "mconn"),
    ("qt5", "buildroot", "mconn"),
    ("qt5", "buildroot", "fusion"),
    ("qt5", "desktop", "desktop"),
    ("qt6", "desktop", "desktop"),
];

pub fn all_targets() -> Vec<BuildTarget> {
    TARGETS
        .iter()
        .flat_map(|&(qt, os, device)| {
            BUILD_TYPES.iter().map(move |&build_type| BuildTarget {
                qt,
                os,
                device,
                build_type,
            })
        })
        .collect()
}

/// Configure-then-build script for `target`, rooted at `sdk_root`.
pub fn build_script(config: &FleetConfig, sdk_root: &Path, target: &BuildTarget) -> String {
    let build_dir = sdk_root.join("build").join(target.build_dir());
    let toolchain = sdk_root
        .join("lib/cmake/mrs-sdk-qt/toolchains")
        .join(target.toolchain_file());
    let cmake = config.cmake.display();

    let configure = format!(
        "{cmake} -S {} -B {} -G '{}' -DCMAKE_TOOLCHAIN_FILE:STRING={} \
         -DMRS_SDK_QT_TARGET_DEVICE:STRING={} -DCMAKE_BUILD_TYPE:STRING={}",
        sdk_root.join("lib").display(),
        build_dir.display(),
        config.generator,
        toolchain.display(),
        target.device,
        target.build_type,
    );
    let build = format!("{cmake} --build {} --target all", build_dir.display());

    match config.env_setup.get(target.os) {
        Some(setup) => format!("{setup} && {configure} && {build}"),
        None => format!("{configure} && {build}"),
    }
}

/// Catalog with one shell build per target, in target order.
pub fn catalog_for(config: &FleetConfig, sdk_root: &Path) -> Result<JobCatalog, CatalogError> {
    let jobs = all_targets()
        .iter()
        .map(|target| {
            let script = build_script(config, sdk_root, target);
            Job::new(
                target.build_dir(),
                ShellBuild::new(&config.shell, script, sdk_root),
            )
        })
        .collect();
    JobCatalog::new(jobs)
}
