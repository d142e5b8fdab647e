//! Pure lookups and derivations over a decoded constant pool, shared by the
//! decoder's diagnostics and the interpreter's instruction decoding.

use crate::class_parser::constants::CpInfo;
use crate::class_parser::types::U2;
use crate::class_parser::ParseError;

/// A fully resolved field/method/interface-method reference.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MemberRef<'a> {
    pub class_name: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
}

pub fn entry_at(pool: &[CpInfo], index: U2) -> Result<&CpInfo, ParseError> {
    if index == 0 {
        // slot 0 is unused, the pool is 1-based
        return Err(ParseError::BadPoolIndex(index));
    }

    pool.get(index as usize - 1)
        .ok_or(ParseError::BadPoolIndex(index))
}

pub fn utf8_at(pool: &[CpInfo], index: U2) -> Result<&str, ParseError> {
    match entry_at(pool, index)? {
        CpInfo::Utf8(text) => Ok(text),
        other => Err(ParseError::UnexpectedEntry {
            index,
            expected: "Utf8",
            found: other.entry_kind(),
        }),
    }
}

pub fn class_name_at(pool: &[CpInfo], index: U2) -> Result<&str, ParseError> {
    match entry_at(pool, index)? {
        CpInfo::Class(name_index) => utf8_at(pool, *name_index),
        other => Err(ParseError::UnexpectedEntry {
            index,
            expected: "Class",
            found: other.entry_kind(),
        }),
    }
}

pub fn name_and_type_at(pool: &[CpInfo], index: U2) -> Result<(&str, &str), ParseError> {
    match entry_at(pool, index)? {
        CpInfo::NameAndType(name_index, descriptor_index) => {
            Ok((utf8_at(pool, *name_index)?, utf8_at(pool, *descriptor_index)?))
        }
        other => Err(ParseError::UnexpectedEntry {
            index,
            expected: "NameAndType",
            found: other.entry_kind(),
        }),
    }
}

/// Resolves a Fieldref/Methodref/InterfaceMethodref entry down to the owning
/// class name and the member's name and descriptor.
pub fn member_ref_at(pool: &[CpInfo], index: U2) -> Result<MemberRef, ParseError> {
    let (class_index, name_and_type_index) = match entry_at(pool, index)? {
        CpInfo::Fieldref(c, nt)
        | CpInfo::Methodref(c, nt)
        | CpInfo::InterfaceMethodref(c, nt) => (*c, *nt),
        other => {
            return Err(ParseError::UnexpectedEntry {
                index,
                expected: "Fieldref/Methodref/InterfaceMethodref",
                found: other.entry_kind(),
            })
        }
    };

    let class_name = class_name_at(pool, class_index)?;
    let (name, descriptor) = name_and_type_at(pool, name_and_type_index)?;

    Ok(MemberRef {
        class_name,
        name,
        descriptor,
    })
}

#[cfg(test)]
mod tests {
    use crate::class_parser::constant_pool::{class_name_at, entry_at, member_ref_at, utf8_at};
    use crate::class_parser::constants::CpInfo;
    use crate::class_parser::ParseError;

    fn sample_pool() -> Vec<CpInfo> {
        vec![
            CpInfo::Utf8("foo/Bar".to_string()),          // 1
            CpInfo::Class(1),                             // 2
            CpInfo::Utf8("baz".to_string()),              // 3
            CpInfo::Utf8("(J)V".to_string()),             // 4
            CpInfo::NameAndType(3, 4),                    // 5
            CpInfo::Methodref(2, 5),                      // 6
            CpInfo::Long(-1),                             // 7
            CpInfo::Hole,                                 // 8
        ]
    }

    #[test]
    fn resolves_through_class_and_name_and_type() {
        let pool = sample_pool();

        assert_eq!(utf8_at(&pool, 1).unwrap(), "foo/Bar");
        assert_eq!(class_name_at(&pool, 2).unwrap(), "foo/Bar");

        let member = member_ref_at(&pool, 6).unwrap();
        assert_eq!(member.class_name, "foo/Bar");
        assert_eq!(member.name, "baz");
        assert_eq!(member.descriptor, "(J)V");
    }

    #[test]
    fn index_zero_and_overflow_are_rejected() {
        let pool = sample_pool();

        assert!(matches!(entry_at(&pool, 0), Err(ParseError::BadPoolIndex(0))));
        assert!(matches!(entry_at(&pool, 9), Err(ParseError::BadPoolIndex(9))));
    }

    #[test]
    fn wrong_entry_kind_is_reported() {
        let pool = sample_pool();

        assert!(matches!(
            class_name_at(&pool, 7),
            Err(ParseError::UnexpectedEntry { index: 7, .. })
        ));
        assert!(matches!(
            utf8_at(&pool, 8),
            Err(ParseError::UnexpectedEntry { index: 8, .. })
        ));
    }
}
