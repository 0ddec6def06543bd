//! User and group name lookup for `-user` / `-group`.

use std::ffi::CString;
use std::mem::MaybeUninit;

/// Largest scratch buffer handed to the `get*nam_r` calls before giving up
const MAX_BUFFER: usize = 1 << 20;

/// uid of `arg`, looked up as a user name first and then read as a decimal id
pub fn resolve_user(arg: &str) -> Option<u32> {
    uid_by_name(arg).or_else(|| arg.parse().ok())
}

/// gid of `arg`, looked up as a group name first and then read as a decimal id
pub fn resolve_group(arg: &str) -> Option<u32> {
    gid_by_name(arg).or_else(|| arg.parse().ok())
}

pub fn uid_by_name(name: &str) -> Option<u32> {
    let c_name = CString::new(name).ok()?;
    let mut buf: Vec<libc::c_char> = vec![0; 1024];

    loop {
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        // SAFETY: every pointer is valid for the duration of the call and
        // `buf.len()` is the real length of `buf`
        let rc = unsafe {
            libc::getpwnam_r(
                c_name.as_ptr(),
                pwd.as_mut_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        // SAFETY: a non-null result means `pwd` was filled in
        return Some(unsafe { pwd.assume_init() }.pw_uid);
    }
}

pub fn gid_by_name(name: &str) -> Option<u32> {
    let c_name = CString::new(name).ok()?;
    let mut buf: Vec<libc::c_char> = vec![0; 1024];

    loop {
        let mut grp = MaybeUninit::<libc::group>::uninit();
        let mut result: *mut libc::group = std::ptr::null_mut();
        // SAFETY: as in `uid_by_name`
        let rc = unsafe {
            libc::getgrnam_r(
                c_name.as_ptr(),
                grp.as_mut_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };

        if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        // SAFETY: a non-null result means `grp` was filled in
        return Some(unsafe { grp.assume_init() }.gr_gid);
    }
}

/// Name of `uid` in the password database, if it has one
pub fn user_name(uid: u32) -> Option<String> {
    let mut buf: Vec<libc::c_char> = vec![0; 1024];

    loop {
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        // SAFETY: as in `uid_by_name`
        let rc = unsafe {
            libc::getpwuid_r(uid, pwd.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result)
        };

        if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        // SAFETY: a non-null result means `pwd` was filled in, and `pw_name`
        // points into `buf`, which is still alive
        let name = unsafe { std::ffi::CStr::from_ptr(pwd.assume_init().pw_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fallback() {
        assert_eq!(resolve_user("4242"), uid_by_name("4242").or(Some(4242)));
        assert_eq!(resolve_group("17"), gid_by_name("17").or(Some(17)));
        assert_eq!(resolve_user("no-such-user-tally"), None);
        assert_eq!(resolve_group("no-such-group-tally"), None);
        assert_eq!(resolve_user("bad\0name"), None);
    }

    #[test]
    fn root_is_uid_zero() {
        // every unix password database has root as uid 0
        assert_eq!(uid_by_name("root"), Some(0));
        assert_eq!(user_name(0).as_deref(), Some("root"));
    }

    #[test]
    fn current_user_round_trips() {
        // SAFETY: getuid cannot fail
        let uid = unsafe { libc::getuid() };
        if let Some(name) = user_name(uid) {
            assert_eq!(resolve_user(&name), Some(uid));
        }
    }
}
