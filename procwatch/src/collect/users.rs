//! Owner lookup: real uid from a process status file, name from passwd.
//!
//! Stateless. The account directory is re-read on every lookup.

use crate::fs::{ProcFs, STATUS_FILENAME};
use crate::text::{is_number, read_optional, split, split_in_two};
use std::path::Path;

const UID_KEY: &str = "Uid";

/// Real uid (first value of the `Uid:` line) from status content.
pub fn parse_real_uid(status: &str) -> Option<&str> {
    status.lines().find_map(|line| {
        let (key, values) = split_in_two(line, ":");
        if key != UID_KEY {
            return None;
        }
        values.split_whitespace().next().filter(|uid| is_number(uid))
    })
}

/// Name of the passwd record whose third field equals `uid`.
pub fn lookup_user<'a>(passwd: &'a str, uid: &str) -> Option<&'a str> {
    passwd.lines().find_map(|line| {
        let fields = split(line, ':');
        match fields.as_slice() {
            [name, _password, id, ..] if is_number(id) && *id == uid => Some(*name),
            _ => None,
        }
    })
}

/// Owner name of the process in `process_dir`, or an empty string.
pub fn resolve_owner(fs: &ProcFs, process_dir: &Path) -> String {
    let Some(status) = read_optional(&process_dir.join(STATUS_FILENAME)) else {
        return String::new();
    };
    let Some(uid) = parse_real_uid(&status) else {
        return String::new();
    };
    read_optional(fs.passwd())
        .and_then(|passwd| lookup_user(&passwd, uid).map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWD: &str = "root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
user10:x:10:10::/home/user10:/bin/sh
alice:x:1000:1000:Alice,,,:/home/alice:/bin/bash
";

    #[test]
    fn test_parse_real_uid() {
        let status = "Name:\tbash\nUmask:\t0022\nState:\tS (sleeping)\nUid:\t1000\t1000\t1000\t1000\nGid:\t1000\t1000\t1000\t1000\n";
        assert_eq!(parse_real_uid(status), Some("1000"));
        assert_eq!(parse_real_uid("Name:\tbash\n"), None);
        assert_eq!(parse_real_uid("Uid:\t\n"), None);
    }

    #[test]
    fn test_lookup_user_matches_exact_field() {
        assert_eq!(lookup_user(PASSWD, "0"), Some("root"));
        assert_eq!(lookup_user(PASSWD, "1000"), Some("alice"));
        // "10" is a substring of "1000" but must match user10's field exactly
        assert_eq!(lookup_user(PASSWD, "10"), Some("user10"));
        assert_eq!(lookup_user(PASSWD, "4242"), None);
        assert_eq!(lookup_user("broken-line\n", "0"), None);
    }

    #[test]
    fn test_resolve_owner() {
        let dir = tempfile::tempdir().expect("tempdir");
        let passwd = dir.path().join("passwd");
        std::fs::write(&passwd, PASSWD).expect("write passwd");
        let proc_dir = dir.path().join("proc").join("7");
        std::fs::create_dir_all(&proc_dir).expect("mkdir");
        std::fs::write(proc_dir.join("status"), "Name:\tinit\nUid:\t0\t0\t0\t0\n")
            .expect("write status");

        let fs = ProcFs::new(dir.path().join("proc")).with_passwd(&passwd);
        assert_eq!(resolve_owner(&fs, &proc_dir), "root");

        // Vanished process
        assert_eq!(resolve_owner(&fs, &dir.path().join("proc").join("8")), "");

        // Missing account directory
        let fs = fs.with_passwd(dir.path().join("nope"));
        assert_eq!(resolve_owner(&fs, &proc_dir), "");
    }
}
