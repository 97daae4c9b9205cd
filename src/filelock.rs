use std::fs::File;
use std::io;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg};
use nix::libc;

/// Takes a shared advisory lock covering the whole file, waiting until any
/// conflicting writer is gone. The lock is released when `file` is closed.
pub fn lock_file_read(file: &File) -> io::Result<()> {
    lock_whole_file(file, libc::F_RDLCK)
}

/// Takes an exclusive advisory lock covering the whole file, waiting until
/// every other holder is gone. The lock is released when `file` is closed.
pub fn lock_file_write(file: &File) -> io::Result<()> {
    lock_whole_file(file, libc::F_WRLCK)
}

fn lock_whole_file(file: &File, lock_type: libc::c_int) -> io::Result<()> {
    let lock = libc::flock {
        l_type: lock_type as libc::c_short,
        l_whence: libc::SEEK_SET as libc::c_short,
        l_start: 0,
        l_len: 0, // zero length covers the file however far it grows
        l_pid: 0,
    };
    loop {
        match fcntl(file, FcntlArg::F_SETLKW(&lock)) {
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(io::Error::from(errno)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempfile;

    #[test]
    fn read_lock_succeeds_on_plain_file() {
        let mut file = tempfile().unwrap();
        file.write_all(b"contents").unwrap();
        lock_file_read(&file).unwrap();
    }

    #[test]
    fn write_lock_succeeds_on_plain_file() {
        let file = tempfile().unwrap();
        lock_file_write(&file).unwrap();
    }

    #[test]
    fn read_locks_are_shared() {
        // Two descriptors on the same file may both hold the shared lock.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.txt");
        std::fs::write(&path, b"shared").unwrap();

        let first = File::open(&path).unwrap();
        let second = File::open(&path).unwrap();
        lock_file_read(&first).unwrap();
        lock_file_read(&second).unwrap();
    }
}
