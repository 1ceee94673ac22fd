//! Mounted volume enumeration.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default mount table location on Linux.
pub const MOUNT_TABLE: &str = "/proc/self/mounts";

const PSEUDO_FILESYSTEMS: &[&str] = &[
    "proc",
    "sysfs",
    "devtmpfs",
    "devpts",
    "tmpfs",
    "securityfs",
    "debugfs",
    "tracefs",
    "pstore",
    "bpf",
    "mqueue",
    "hugetlbfs",
    "configfs",
    "fusectl",
    "autofs",
    "binfmt_misc",
    "rpc_pipefs",
    "nsfs",
    "overlay",
    "squashfs",
];

fn is_pseudo(fs_type: &str) -> bool {
    fs_type.starts_with("cgroup") || PSEUDO_FILESYSTEMS.contains(&fs_type)
}

/// Decode the octal escapes (`\040` for space and friends) used in mount tables.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits.iter().fold(0u16, |acc, b| acc * 8 + u16::from(b - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Mount points of real storage volumes listed in a mount table.
pub fn parse_mount_table(contents: &str) -> Vec<PathBuf> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _device = fields.next()?;
            let mount_point = fields.next()?;
            let fs_type = fields.next()?;
            if is_pseudo(fs_type) {
                return None;
            }
            Some(PathBuf::from(unescape(mount_point)))
        })
        .collect()
}

/// Read a mount table, yielding nothing if it cannot be read.
pub fn read_mount_points(table: &Path) -> Vec<PathBuf> {
    match fs::read_to_string(table) {
        Ok(contents) => parse_mount_table(&contents),
        Err(e) => {
            debug!("Mount table {} unavailable: {}", table.display(), e);
            Vec::new()
        }
    }
}

/// Drive roots `A:\` through `Z:\` that currently exist.
#[cfg(windows)]
pub fn drive_roots() -> Vec<PathBuf> {
    (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|root| root.exists())
        .collect()
}

#[cfg(not(windows))]
pub fn drive_roots() -> Vec<PathBuf> {
    Vec::new()
}
