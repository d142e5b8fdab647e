use num_enum::TryFromPrimitive;
use strum_macros::Display;

/// The implemented opcode subset. Any byte outside this set aborts execution
/// with an unimplemented-opcode error carrying the byte and the pc.
#[derive(TryFromPrimitive, Display, Debug, Copy, Clone, PartialEq)]
#[repr(u8)]
#[allow(non_camel_case_types)]
pub enum Opcode {
    aconst_null = 1,
    iconst_m1 = 2,
    iconst_0 = 3,
    iconst_1 = 4,
    iconst_2 = 5,
    iconst_3 = 6,
    iconst_4 = 7,
    iconst_5 = 8,
    lconst_0 = 9,
    lconst_1 = 10,
    dconst_0 = 14,
    dconst_1 = 15,
    bipush = 16,
    sipush = 17,
    ldc = 18,
    ldc2_w = 20,
    iload = 21,
    lload = 22,
    aload = 25,
    iload_0 = 26,
    iload_1 = 27,
    iload_2 = 28,
    iload_3 = 29,
    lload_0 = 30,
    lload_1 = 31,
    lload_2 = 32,
    lload_3 = 33,
    aload_0 = 42,
    aload_1 = 43,
    aload_2 = 44,
    aload_3 = 45,
    istore = 54,
    lstore = 55,
    astore = 58,
    istore_0 = 59,
    istore_1 = 60,
    istore_2 = 61,
    istore_3 = 62,
    lstore_0 = 63,
    lstore_1 = 64,
    lstore_2 = 65,
    lstore_3 = 66,
    astore_0 = 75,
    astore_1 = 76,
    astore_2 = 77,
    astore_3 = 78,
    pop = 87,
    pop2 = 88,
    dup = 89,
    iadd = 96,
    ladd = 97,
    imul = 104,
    iinc = 132,
    i2l = 133,
    i2f = 134,
    i2d = 135,
    l2i = 136,
    l2f = 137,
    l2d = 138,
    i2b = 145,
    i2c = 146,
    i2s = 147,
    dcmpl = 151,
    ifne = 154,
    goto = 167,
    ireturn = 172,
    lreturn = 173,
    dreturn = 175,
    _return = 177,
    getstatic = 178,
    putstatic = 179,
    invokevirtual = 182,
    invokespecial = 183,
    invokestatic = 184,
    invokeinterface = 185,
    new = 187,
    /// Reserved byte repurposed to end the synthetic bootstrap sequence.
    halt = 255,
}
