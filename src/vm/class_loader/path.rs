use std::io;
use std::path::PathBuf;

use crate::class_parser::parse_class;
use crate::vm::class::class::Class;
use crate::vm::class_loader::link::derive_class;
use crate::vm::class_loader::ClassFinder;
use crate::vm::error::VmError;

/// One classpath root: a byte-producing lookup by qualified name. Directory
/// roots live here; archive roots are further implementations of the same
/// trait.
pub trait ClasspathEntry {
    fn class_bytes(&self, binary_name: &str) -> io::Result<Option<Vec<u8>>>;
}

pub struct DirEntry {
    root: PathBuf,
}

impl DirEntry {
    pub fn new(root: impl Into<PathBuf>) -> DirEntry {
        DirEntry { root: root.into() }
    }
}

impl ClasspathEntry for DirEntry {
    fn class_bytes(&self, binary_name: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.root.join(format!("{}.class", binary_name));

        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// The default loader: searches an ordered list of classpath roots and
/// decodes whatever bytes the first match produces.
pub struct PathClassFinder {
    entries: Vec<Box<dyn ClasspathEntry>>,
}

impl PathClassFinder {
    pub fn new(entries: Vec<Box<dyn ClasspathEntry>>) -> PathClassFinder {
        PathClassFinder { entries }
    }

    /// Builds directory roots from a `:`-separated classpath string.
    pub fn from_spec(spec: &str) -> PathClassFinder {
        let entries = spec
            .split(':')
            .filter(|root| !root.is_empty())
            .map(|root| Box::new(DirEntry::new(root)) as Box<dyn ClasspathEntry>)
            .collect();

        PathClassFinder::new(entries)
    }
}

impl ClassFinder for PathClassFinder {
    fn find_class(&self, name: &str) -> Result<Option<Class>, VmError> {
        for entry in &self.entries {
            if let Some(bytes) = entry.class_bytes(name)? {
                let parsed = parse_class(&bytes)?;
                return Ok(Some(derive_class(parsed)?));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::vm::class_loader::path::{ClasspathEntry, PathClassFinder};
    use crate::vm::class_loader::ClassFinder;
    use crate::vm::error::VmError;

    /// Serves a single fixed class from memory.
    struct OneClassEntry {
        name: &'static str,
        bytes: Vec<u8>,
    }

    impl ClasspathEntry for OneClassEntry {
        fn class_bytes(&self, binary_name: &str) -> io::Result<Option<Vec<u8>>> {
            Ok((binary_name == self.name).then(|| self.bytes.clone()))
        }
    }

    /// `class Empty {}` with no members, assembled by hand.
    fn empty_class_bytes(name: &str) -> Vec<u8> {
        let mut buf = vec![0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34];
        buf.extend_from_slice(&5u16.to_be_bytes());
        buf.push(1); // Utf8
        buf.extend_from_slice(&(name.len() as u16).to_be_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.push(7); // Class
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.push(1); // Utf8
        buf.extend_from_slice(&16u16.to_be_bytes());
        buf.extend_from_slice(b"java/lang/Object");
        buf.push(7); // Class
        buf.extend_from_slice(&3u16.to_be_bytes());
        for half in [0x0021u16, 2, 4, 0, 0, 0, 0] {
            buf.extend_from_slice(&half.to_be_bytes());
        }
        buf
    }

    #[test]
    fn first_root_with_bytes_wins() {
        let finder = PathClassFinder::new(vec![
            Box::new(OneClassEntry {
                name: "Alpha",
                bytes: empty_class_bytes("Alpha"),
            }),
            Box::new(OneClassEntry {
                name: "Beta",
                bytes: empty_class_bytes("Beta"),
            }),
        ]);

        let class = finder.find_class("Beta").unwrap().unwrap();
        assert_eq!(class.name, "Beta");
        assert_eq!(class.superclass.as_deref(), Some("java/lang/Object"));

        assert!(finder.find_class("Gamma").unwrap().is_none());
    }

    #[test]
    fn malformed_bytes_are_a_hard_error() {
        let finder = PathClassFinder::new(vec![Box::new(OneClassEntry {
            name: "Broken",
            bytes: vec![0, 0, 0, 0, 1, 2, 3],
        })]);

        assert!(matches!(
            finder.find_class("Broken"),
            Err(VmError::MalformedClass(_))
        ));
    }
}
