use crate::vm::class::field::FieldType;
use crate::vm::class::method::MethodDescriptor;
use crate::vm::error::VmError;

impl MethodDescriptor {
    fn parse_field_type(str: &str, is_parameter: bool) -> (Option<FieldType>, &str) {
        if str.is_empty() {
            return (None, str);
        }

        match &str[0..1] {
            "B" => (Some(FieldType::B), &str[1..]),
            "C" => (Some(FieldType::C), &str[1..]),
            "D" => (Some(FieldType::D), &str[1..]),
            "F" => (Some(FieldType::F), &str[1..]),
            "I" => (Some(FieldType::I), &str[1..]),
            "J" => (Some(FieldType::J), &str[1..]),
            "L" => match str.find(';') {
                Some(end) if end > 1 && !str[1..end].contains(')') => {
                    (Some(FieldType::L(str[1..end].to_string())), &str[end + 1..])
                }
                _ => (None, str),
            },
            "S" => (Some(FieldType::S), &str[1..]),
            "Z" => (Some(FieldType::Z), &str[1..]),
            "[" => match Self::parse_field_type(&str[1..], true) {
                (Some(component), rest) => (Some(FieldType::A(Box::new(component))), rest),
                _ => (None, str),
            },
            "V" => {
                if is_parameter {
                    (None, str)
                } else {
                    (Some(FieldType::V), &str[1..])
                }
            }
            _ => (None, str),
        }
    }

    pub fn parse(raw: &str) -> Result<MethodDescriptor, VmError> {
        let bad = || VmError::BadDescriptor(raw.to_string());

        let mut rest = raw.strip_prefix('(').ok_or_else(bad)?;

        let mut parameters = vec![];
        loop {
            match Self::parse_field_type(rest, true) {
                (Some(parameter), remaining) => {
                    parameters.push(parameter);
                    rest = remaining;
                }
                _ => break,
            }
        }

        rest = rest.strip_prefix(')').ok_or_else(bad)?;

        match Self::parse_field_type(rest, false) {
            (Some(ret), remaining) if remaining.is_empty() => Ok(MethodDescriptor {
                raw: raw.to_string(),
                parameters,
                ret,
            }),
            _ => Err(bad()),
        }
    }
}

impl FieldType {
    pub fn parse(str: &str) -> Result<FieldType, VmError> {
        match MethodDescriptor::parse_field_type(str, true) {
            (Some(parsed), rest) if rest.is_empty() => Ok(parsed),
            _ => Err(VmError::BadDescriptor(str.to_string())),
        }
    }
}

/// Operand slots consumed by a call with this descriptor: one per parameter
/// character after array markers are dropped and object references collapse
/// to a single placeholder, one extra per wide (`J`/`D`) marker, plus the
/// receiver slot for instance methods.
pub fn argument_slots(descriptor: &str, is_static: bool) -> Result<usize, VmError> {
    let bad = || VmError::BadDescriptor(descriptor.to_string());

    let parameters = descriptor
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .map(|(parameters, _)| parameters)
        .ok_or_else(bad)?;

    let mut slots = if is_static { 0 } else { 1 };
    let mut chars = parameters.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' => continue,
            'L' => {
                if !chars.any(|c| c == ';') {
                    return Err(bad());
                }
                slots += 1;
            }
            'J' | 'D' => slots += 2,
            'B' | 'C' | 'F' | 'I' | 'S' | 'Z' => slots += 1,
            _ => return Err(bad()),
        }
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use crate::vm::class::field::FieldType::*;
    use crate::vm::class::method::MethodDescriptor;
    use crate::vm::class::name_parsers::argument_slots;

    #[test]
    fn parse_method_descriptor() {
        let descriptor = MethodDescriptor::parse("()V").unwrap();
        assert!(descriptor.parameters.is_empty());
        assert_eq!(descriptor.ret, V);

        let descriptor = MethodDescriptor::parse("()[Ljava/lang/String;").unwrap();
        assert_eq!(
            descriptor.ret,
            A(Box::from(L(String::from("java/lang/String"))))
        );

        assert!(MethodDescriptor::parse("(IV)I").is_err());
        assert!(MethodDescriptor::parse("(I)I ").is_err());
        assert!(MethodDescriptor::parse("I").is_err());

        let descriptor = MethodDescriptor::parse("(IJ[[Ljava/lang/String;)I").unwrap();
        assert_eq!(
            descriptor.parameters,
            vec![
                I,
                J,
                A(Box::new(A(Box::new(L(String::from("java/lang/String"))))))
            ]
        );
        assert_eq!(descriptor.ret, I);
    }

    #[test]
    fn receiver_and_wide_parameters_count_extra_slots() {
        // 1 receiver + 1 int + 2 long + 1 reference
        assert_eq!(argument_slots("(IJLfoo/Bar;)V", false).unwrap(), 5);
        assert_eq!(argument_slots("(IJLfoo/Bar;)V", true).unwrap(), 4);
        assert_eq!(argument_slots("()V", true).unwrap(), 0);
    }

    #[test]
    fn array_depth_never_widens_reference_parameters() {
        let flat = argument_slots("(Ljava/lang/String;)V", true).unwrap();
        let one = argument_slots("([Ljava/lang/String;)V", true).unwrap();
        let deep = argument_slots("([[[Ljava/lang/String;)V", true).unwrap();

        assert_eq!(flat, 1);
        assert_eq!(one, flat);
        assert_eq!(deep, flat);
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        assert!(argument_slots("IJ", true).is_err());
        assert!(argument_slots("(Q)V", true).is_err());
        assert!(argument_slots("(Lfoo)V", true).is_err());
    }
}
