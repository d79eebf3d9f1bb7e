//! Environment variable loading and defaults.

use std::env;
use std::str::FromStr;

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;

pub const DEFAULT_LLM_MODEL: &str = "gpt-4-0125-preview";
pub const DEFAULT_LLM_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a bank representative. A customer has called with \
inquiries related to banking services. Guide the conversation by asking about common banking \
services such as account balance inquiries, recent transaction history, loan eligibility and \
credit card information. Respond briefly to the customer's answers and keep the conversation \
flowing naturally. Tell the customer when information is being checked. Be courteous and \
trustworthy. Always answer in Korean, using simple and clear language.";

pub const DEFAULT_GREETING: &str = "Hello?";
pub const DEFAULT_GOODBYE: &str = "Thank you for calling. Goodbye!";
pub const DEFAULT_SAY_VOICE: &str = "Polly.Amy";
pub const DEFAULT_SAY_LANGUAGE: &str = "en-US";

pub const DEFAULT_AUDIO_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_RESPONSE_QUEUE_CAPACITY: usize = 16;
pub const DEFAULT_SESSION_LINGER_SECONDS: u64 = 30;

/// System administration commands a caller must not talk the agent into.
/// An explicitly empty list (`BLOCKED_TERMS=","` or `blocked_terms: []`)
/// turns the guard off.
pub const DEFAULT_BLOCKED_TERMS: &[&str] = &[
    "chown", "chgrp", "useradd", "userdel", "id", "who", "whoami", "logname", "w", "last",
    "groups", "newgrp", "stty", "setserial", "getty", "mesg", "wall", "dmesg", "uname", "arch",
    "lastcomm", "lsof", "strace", "free", "procinfo", "lsdev", "du", "df", "stat", "vmstat",
    "netstat", "uptime", "hostname", "hostid", "logger", "logrotate", "ps", "pstree", "top",
    "nice", "nohup", "pidof", "fuser", "crond", "init", "telinit", "runlevel", "halt",
    "shutdown", "reboot", "ifconfig", "route", "chkconfig", "tcpdump", "mount", "umount",
    "sync", "losetup", "mkswap", "swapon", "swapoff", "mke2fs", "tune2fs", "dumpe2fs", "hdparm",
    "fdisk", "fsck", "e2fsck", "debugfs", "badblocks", "mkbootdisk", "chroot", "lockfile",
    "mknod", "tmpwatch", "MAKEDEV", "dump", "restore", "fdformat", "ulimit", "umask", "rdev",
    "lsmod", "insmod", "modprobe", "depmod", "env", "ldd", "strip", "nm", "rdist", "공격",
];

// =============================================================================
// Helpers
// =============================================================================

/// Read a variable, treating empty values as unset.
pub(super) fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Read and parse a variable.
pub(super) fn parse<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| format!("Invalid value for {name}: {e}"))
        })
        .transpose()
}

/// Read a comma-separated list. Blank entries are dropped.
pub(super) fn list(name: &str) -> Option<Vec<String>> {
    var(name).map(|raw| split_list(&raw))
}

pub(super) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
