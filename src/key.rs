/// Typed keys: a conversion to the byte representation `RawMap` actually
/// stores, plus a declared size so fixed-width keys get compile-time
/// confidence instead of discovering a mismatch at the first insert.
use std::borrow::Cow;

pub trait MapKey {
    /// `Some(n)` for keys that are always exactly `n` bytes; `None` for
    /// variable-length keys (strings, byte slices).
    const FIXED_SIZE: Option<usize>;

    fn as_key_bytes(&self) -> Cow<'_, [u8]>;
}

macro_rules! impl_map_key_for_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl MapKey for $t {
                const FIXED_SIZE: Option<usize> = Some(std::mem::size_of::<$t>());

                fn as_key_bytes(&self) -> Cow<'_, [u8]> {
                    Cow::Owned(self.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_map_key_for_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl MapKey for str {
    const FIXED_SIZE: Option<usize> = None;

    fn as_key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl MapKey for String {
    const FIXED_SIZE: Option<usize> = None;

    fn as_key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl MapKey for [u8] {
    const FIXED_SIZE: Option<usize> = None;

    fn as_key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl MapKey for Vec<u8> {
    const FIXED_SIZE: Option<usize> = None;

    fn as_key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

impl<const N: usize> MapKey for [u8; N] {
    const FIXED_SIZE: Option<usize> = Some(N);

    fn as_key_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_keys_report_their_width() {
        assert_eq!(u64::FIXED_SIZE, Some(8));
        assert_eq!(u32::FIXED_SIZE, Some(4));
        assert_eq!(42u64.as_key_bytes().len(), 8);
    }

    #[test]
    fn string_keys_are_variable_length() {
        assert_eq!(str::FIXED_SIZE, None);
        assert_eq!("hello".as_key_bytes().as_ref(), b"hello");
    }

    #[test]
    fn byte_array_keys_report_their_width() {
        assert_eq!(<[u8; 16]>::FIXED_SIZE, Some(16));
        let k: [u8; 4] = [1, 2, 3, 4];
        assert_eq!(k.as_key_bytes().as_ref(), &[1, 2, 3, 4]);
    }
}
