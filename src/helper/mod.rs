use std::ops::BitAnd;

/// True when every bit of `flag` is set in `value`.
pub fn has_flag<U, T: Into<U>>(value: U, flag: T) -> bool
    where U: BitAnd<Output = U> + PartialEq + Copy {
    let flag = flag.into();

    value & flag == flag
}

#[cfg(test)]
mod tests {
    use crate::class_parser::constants::AccessFlagMethod;
    use crate::helper::has_flag;

    #[test]
    fn single_and_combined_flags() {
        let flags = AccessFlagMethod::ACC_PUBLIC as u16 | AccessFlagMethod::ACC_STATIC as u16;

        assert!(has_flag(flags, AccessFlagMethod::ACC_PUBLIC));
        assert!(has_flag(flags, AccessFlagMethod::ACC_STATIC));
        assert!(!has_flag(flags, AccessFlagMethod::ACC_NATIVE));
    }
}
