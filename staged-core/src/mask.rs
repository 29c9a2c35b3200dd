use alloc::boxed::Box;

const WORD_BITS: usize = u64::BITS as usize;

/// Which fields of a checked builder currently hold a value.
///
/// Bit `i` is set exactly while slot `i` of the builder holds a value. The
/// mask knows how many fields its record has, so [`first_unset`] needs no
/// extra argument. Records of up to 64 fields keep their bits inline; wider
/// ones allocate once, when the builder is created.
///
/// [`first_unset`]: PresenceMask::first_unset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresenceMask {
    len: usize,
    bits: Bits,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Bits {
    Inline(u64),
    Spilled(Box<[u64]>),
}

impl Bits {
    fn words(&self) -> &[u64] {
        match self {
            Bits::Inline(word) => core::slice::from_ref(word),
            Bits::Spilled(words) => words,
        }
    }

    fn words_mut(&mut self) -> &mut [u64] {
        match self {
            Bits::Inline(word) => core::slice::from_mut(word),
            Bits::Spilled(words) => words,
        }
    }
}

impl PresenceMask {
    /// A mask for a record of `len` fields, all absent.
    pub fn new(len: usize) -> Self {
        let bits = if len <= WORD_BITS {
            Bits::Inline(0)
        } else {
            Bits::Spilled(alloc::vec![0; len.div_ceil(WORD_BITS)].into_boxed_slice())
        };
        Self { len, bits }
    }

    fn locate(&self, index: usize) -> (usize, u64) {
        debug_assert!(
            index < self.len,
            "field {index} out of range for a record of {} fields",
            self.len
        );
        (index / WORD_BITS, 1 << (index % WORD_BITS))
    }

    /// Records that field `index` now holds a value.
    #[inline]
    pub fn set(&mut self, index: usize) {
        let (word, bit) = self.locate(index);
        self.bits.words_mut()[word] |= bit;
    }

    /// Records that field `index` no longer holds a value.
    #[inline]
    pub fn unset(&mut self, index: usize) {
        let (word, bit) = self.locate(index);
        self.bits.words_mut()[word] &= !bit;
    }

    /// Whether field `index` holds a value.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        let (word, bit) = self.locate(index);
        self.bits.words()[word] & bit != 0
    }

    /// The first field, in declaration order, that holds no value. `None`
    /// once the record can be built.
    pub fn first_unset(&self) -> Option<usize> {
        self.bits
            .words()
            .iter()
            .enumerate()
            .find_map(|(i, word)| {
                let offset = (!word).trailing_zeros() as usize;
                (offset < WORD_BITS).then_some(i * WORD_BITS + offset)
            })
            .filter(|&index| index < self.len)
    }
}
