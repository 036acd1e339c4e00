use std::fmt;

use serde::{Deserialize, Serialize};

use super::{FsError, Result, MAX_NAME_LEN, NAME_FIELD_LEN};

/// a file or directory name in its on-disk form:
/// UTF-8 bytes, zero padded to [NAME_FIELD_LEN]
///
/// an all-zero name marks an empty directory slot
#[derive(Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileName([u8; NAME_FIELD_LEN]);

impl FileName {
    /// validate `name` and pad it into the fixed field
    ///
    /// names must be 1 to [MAX_NAME_LEN] bytes long and contain neither `/` nor NUL
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty()
            || name.len() > MAX_NAME_LEN
            || name.contains('/')
            || name.contains('\0')
        {
            return Err(FsError::InvalidName(name.to_string()));
        }
        let mut field = [0u8; NAME_FIELD_LEN];
        field[..name.len()].copy_from_slice(name.as_bytes());
        Ok(FileName(field))
    }

    /// the name of the root directory, which lives in no directory
    pub(crate) fn root() -> Self {
        let mut field = [0u8; NAME_FIELD_LEN];
        field[0] = b'/';
        FileName(field)
    }

    pub fn as_bytes(&self) -> &[u8] {
        let len = self.0.iter().position(|b| *b == 0).unwrap_or(NAME_FIELD_LEN);
        &self.0[..len]
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// compare against a path component without building a [FileName]
    pub fn matches(&self, name: &str) -> bool {
        !self.is_empty() && self.as_bytes() == name.as_bytes()
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        let name = FileName::new("a.txt").unwrap();
        assert_eq!(name.as_bytes(), b"a.txt");
        assert_eq!(name.to_string(), "a.txt");
        assert!(name.matches("a.txt"));
        assert!(!name.matches("a.tx"));

        let longest = "x".repeat(MAX_NAME_LEN);
        assert_eq!(FileName::new(&longest).unwrap().as_bytes().len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(FileName::new(""), Err(FsError::InvalidName(_))));
        assert!(matches!(FileName::new("a/b"), Err(FsError::InvalidName(_))));
        assert!(matches!(FileName::new("nul\0"), Err(FsError::InvalidName(_))));
        let too_long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(FileName::new(&too_long), Err(FsError::InvalidName(_))));
    }

    #[test]
    fn test_empty_slot_never_matches() {
        let empty = FileName::default();
        assert!(empty.is_empty());
        assert!(!empty.matches(""));
    }
}
