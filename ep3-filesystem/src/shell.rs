//! The interactive front end: tokenizes one line of input into a command
//! and dispatches it against the mounted filesystem, if any. This module is
//! deliberately thin — it owns no filesystem semantics of its own, only the
//! mapping from a line of text to a `Filesystem` method call.

use std::io::Write;
use std::path::PathBuf;

use simcore_config::FilesystemSection;

use crate::error::{Error, Result};
use crate::filesystem::Filesystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mount(PathBuf),
    Unmount,
    Mkdir(String),
    Rmdir(String),
    Touch(String),
    Rm(String),
    Cp(PathBuf, String),
    Cat(String),
    Ls(String),
    Find(String, String),
    Df,
    Exit,
}

/// Tokenizes one line on whitespace and maps the leading token to a command.
pub fn parse(line: &str) -> Result<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (head, rest) = tokens.split_first().ok_or_else(|| Error::InvalidCommand("empty command".into()))?;
    match *head {
        "mount" => one_arg(rest).map(|p| Command::Mount(PathBuf::from(p))),
        "unmount" => Ok(Command::Unmount),
        "mkdir" => one_arg(rest).map(|p| Command::Mkdir(p.to_string())),
        "rmdir" => one_arg(rest).map(|p| Command::Rmdir(p.to_string())),
        "touch" => one_arg(rest).map(|p| Command::Touch(p.to_string())),
        "rm" => one_arg(rest).map(|p| Command::Rm(p.to_string())),
        "cat" => one_arg(rest).map(|p| Command::Cat(p.to_string())),
        "ls" => Ok(Command::Ls(rest.first().copied().unwrap_or("/").to_string())),
        "cp" => two_args(rest).map(|(a, b)| Command::Cp(PathBuf::from(a), b.to_string())),
        "find" => two_args(rest).map(|(a, b)| Command::Find(a.to_string(), b.to_string())),
        "df" => Ok(Command::Df),
        "sai" => Ok(Command::Exit),
        other => Err(Error::InvalidCommand(other.to_string())),
    }
}

fn one_arg<'a>(rest: &[&'a str]) -> Result<&'a str> {
    match rest {
        [arg] => Ok(arg),
        _ => Err(Error::InvalidCommand(format!("expected exactly one argument, got {}", rest.len()))),
    }
}

fn two_args<'a>(rest: &[&'a str]) -> Result<(&'a str, &'a str)> {
    match rest {
        [a, b] => Ok((a, b)),
        _ => Err(Error::InvalidCommand(format!("expected exactly two arguments, got {}", rest.len()))),
    }
}

/// Runs `command` against `mounted`, writing any textual output to `out`.
/// Returns `false` when the session should end (the `sai` command).
pub fn dispatch(
    mounted: &mut Option<Filesystem>,
    command: Command,
    cfg: &FilesystemSection,
    out: &mut impl Write,
) -> Result<bool> {
    match command {
        Command::Mount(path) => {
            if mounted.is_some() {
                return Err(Error::AlreadyMounted);
            }
            *mounted = Some(Filesystem::mount(&path, cfg)?);
            Ok(true)
        }
        Command::Unmount => {
            let fs = mounted.take().ok_or(Error::NotMounted)?;
            fs.unmount()?;
            Ok(true)
        }
        Command::Exit => {
            if let Some(fs) = mounted.take() {
                fs.unmount()?;
            }
            Ok(false)
        }
        other => {
            let fs = mounted.as_mut().ok_or(Error::NotMounted)?;
            run_mounted(fs, other, out)?;
            Ok(true)
        }
    }
}

fn run_mounted(fs: &mut Filesystem, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Mkdir(path) => fs.mkdir(&path),
        Command::Rmdir(path) => fs.rmdir(&path),
        Command::Touch(path) => fs.touch(&path),
        Command::Rm(path) => fs.rm(&path),
        Command::Cp(host, image) => fs.cp(&host, &image),
        Command::Cat(path) => {
            let bytes = fs.cat(&path)?;
            out.write_all(&bytes)?;
            Ok(())
        }
        Command::Ls(path) => {
            let entries = fs.ls(&path)?;
            for entry in entries {
                writeln!(out, "{}{}", entry.name, if entry.is_dir { "/" } else { "" })?;
            }
            Ok(())
        }
        Command::Find(base, needle) => {
            for hit in fs.find(&base, &needle)? {
                writeln!(out, "{hit}")?;
            }
            Ok(())
        }
        Command::Df => {
            let (free, total) = fs.df();
            writeln!(out, "{free}/{total} blocks free")?;
            Ok(())
        }
        Command::Mount(_) | Command::Unmount | Command::Exit => {
            Err(Error::Internal("state commands never reach run_mounted".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_command() {
        assert_eq!(parse("mount img.fs").unwrap(), Command::Mount(PathBuf::from("img.fs")));
        assert_eq!(parse("mkdir /a").unwrap(), Command::Mkdir("/a".into()));
        assert_eq!(parse("cp host.bin /dst").unwrap(), Command::Cp(PathBuf::from("host.bin"), "/dst".into()));
        assert_eq!(parse("find /a needle").unwrap(), Command::Find("/a".into(), "needle".into()));
        assert_eq!(parse("df").unwrap(), Command::Df);
        assert_eq!(parse("sai").unwrap(), Command::Exit);
    }

    #[test]
    fn ls_defaults_to_root_with_no_argument() {
        assert_eq!(parse("ls").unwrap(), Command::Ls("/".into()));
    }

    #[test]
    fn rejects_unknown_commands_and_wrong_arity() {
        assert!(parse("frobnicate").is_err());
        assert!(parse("mkdir").is_err());
        assert!(parse("cp only-one-arg").is_err());
    }

    #[test]
    fn operations_before_mount_fail_as_not_mounted() {
        let mut mounted: Option<Filesystem> = None;
        let cfg = FilesystemSection::default();
        let mut out = Vec::new();
        let result = dispatch(&mut mounted, Command::Ls("/".into()), &cfg, &mut out);
        assert!(matches!(result, Err(Error::NotMounted)));
    }

    #[test]
    fn mounting_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FilesystemSection { block_size: 256, capacity: 256 * 64, fill_byte: 0xFF };
        let mut mounted: Option<Filesystem> = None;
        let mut out = Vec::new();
        dispatch(&mut mounted, Command::Mount(dir.path().join("a.img")), &cfg, &mut out).unwrap();
        let result = dispatch(&mut mounted, Command::Mount(dir.path().join("b.img")), &cfg, &mut out);
        assert!(matches!(result, Err(Error::AlreadyMounted)));
    }
}
