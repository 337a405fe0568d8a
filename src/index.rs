/// A stable handle into a map's value array.
///
/// Wrapping the raw `i32` data index rather than exposing a bare integer
/// keeps callers from accidentally doing arithmetic on it or mixing it up
/// with an unrelated integer; it is only ever meaningful as an argument
/// back to the map it came from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Index(pub(crate) i32);

impl Index {
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl From<Index> for usize {
    fn from(idx: Index) -> usize {
        idx.get()
    }
}
