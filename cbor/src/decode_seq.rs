use super::decode::*;

/// A stateful iterator over the items of a CBOR array, map, or bare sequence.
///
/// `D` is the stride of the sequence: `0` for a free-standing sequence of
/// top-level items, `1` for an array, `2` for a map (whose items come in
/// key/value pairs, so `count` here is already twice the logical entry count).
pub struct Series<'a, const D: usize> {
    data: &'a [u8],
    count: Option<usize>,
    offset: &'a mut usize,
    parsed: usize,
}

impl<'a, const D: usize> Series<'a, D> {
    pub(super) fn new(data: &'a [u8], count: Option<usize>, offset: &'a mut usize) -> Self {
        Self {
            data,
            count,
            offset,
            parsed: 0,
        }
    }

    /// The number of logical entries, if the sequence has a definite length.
    pub fn len(&self) -> Option<usize> {
        self.count.map(|c| if D == 0 { c } else { c / D })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// `true` if the sequence was encoded with a known, definite length.
    pub fn is_definite(&self) -> bool {
        self.count.is_some()
    }

    /// Current byte offset into the original data, past everything parsed so far.
    pub fn offset(&self) -> usize {
        *self.offset
    }

    fn check_for_end(&mut self) -> Result<bool, Error> {
        if let Some(count) = self.count {
            Ok(self.parsed >= count)
        } else if *self.offset >= self.data.len() {
            if D == 0 {
                self.count = Some(self.parsed);
                Ok(true)
            } else {
                Err(Error::NeedMoreData(1))
            }
        } else if self.data[*self.offset] == 0xFF {
            if D == 2 && self.parsed % 2 == 1 {
                Err(Error::PartialMap)
            } else {
                *self.offset += 1;
                self.count = Some(self.parsed);
                Ok(true)
            }
        } else {
            Ok(false)
        }
    }

    /// `true` if there are no further items to parse in this sequence.
    pub fn at_end(&mut self) -> Result<bool, Error> {
        self.check_for_end()
    }

    pub(super) fn complete<T>(mut self, r: T) -> Result<T, Error> {
        if self.check_for_end()? {
            Ok(r)
        } else {
            Err(Error::AdditionalItems)
        }
    }

    /// Skips the next value in the sequence, recursing into nested arrays and
    /// maps up to `max_recursion` levels deep.
    pub fn skip_value(&mut self, max_recursion: usize) -> Result<Option<bool>, Error> {
        self.try_parse_value(|mut value, shortest, tags| {
            value
                .skip(max_recursion)
                .map(|s| s && shortest && tags.is_empty())
        })
    }

    /// Skips every remaining value in the sequence.
    pub fn skip_to_end(&mut self, max_recursion: usize) -> Result<bool, Error> {
        let mut shortest = true;
        while let Some(s) = self.skip_value(max_recursion)? {
            shortest = shortest && s;
        }
        Ok(shortest)
    }

    /// Parses the next item, if any remain, giving its raw [`Value`] to `f`.
    pub fn try_parse_value<T, F, E>(&mut self, f: F) -> Result<Option<T>, E>
    where
        F: FnOnce(Value, bool, &[u64]) -> Result<T, E>,
        E: From<Error>,
    {
        if self.check_for_end()? {
            return Ok(None);
        }
        let item_start = *self.offset;
        let (r, len) = parse_value(&self.data[item_start..], f)?;
        self.parsed += 1;
        *self.offset += len;
        Ok(Some(r))
    }

    /// Like [`Self::try_parse_value`] but errors if the sequence has already ended.
    pub fn parse_value<T, F, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(Value, bool, &[u64]) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_value(f)?
            .ok_or_else(|| Error::NoMoreItems.into())
    }

    /// Parses the next item as a `T: FromCbor`, if any remain.
    pub fn try_parse<T>(&mut self) -> Result<Option<(T, bool)>, T::Error>
    where
        T: FromCbor,
        T::Error: From<Error>,
    {
        if self.check_for_end()? {
            return Ok(None);
        }
        let (value, shortest, len) = T::from_cbor(&self.data[*self.offset..])?;
        self.parsed += 1;
        *self.offset += len;
        Ok(Some((value, shortest)))
    }

    /// Like [`Self::try_parse`] but errors if the sequence has already ended.
    pub fn parse<T>(&mut self) -> Result<(T, bool), T::Error>
    where
        T: FromCbor,
        T::Error: From<Error>,
    {
        self.try_parse::<T>()?
            .ok_or_else(|| Error::NoMoreItems.into())
    }

    /// Parses the next item as a nested array, if any remain.
    pub fn try_parse_array<T, F, E>(&mut self, f: F) -> Result<Option<T>, E>
    where
        F: FnOnce(&mut Array, bool, &[u64]) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_value(|value, shortest, tags| match value {
            Value::Array(a) => f(a, shortest, tags),
            _ => Err(
                Error::IncorrectType("Array".to_string(), value.type_name(!tags.is_empty()))
                    .into(),
            ),
        })
    }

    /// Like [`Self::try_parse_array`] but errors if the sequence has already ended.
    pub fn parse_array<T, F, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Array, bool, &[u64]) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_array(f)?
            .ok_or_else(|| Error::NoMoreItems.into())
    }

    /// Parses the next item as a nested map, if any remain.
    pub fn try_parse_map<T, F, E>(&mut self, f: F) -> Result<Option<T>, E>
    where
        F: FnOnce(&mut Map, bool, &[u64]) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_value(|value, shortest, tags| match value {
            Value::Map(m) => f(m, shortest, tags),
            _ => Err(
                Error::IncorrectType("Map".to_string(), value.type_name(!tags.is_empty())).into(),
            ),
        })
    }

    /// Like [`Self::try_parse_map`] but errors if the sequence has already ended.
    pub fn parse_map<T, F, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Map, bool, &[u64]) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_map(f)?
            .ok_or_else(|| Error::NoMoreItems.into())
    }
}

impl<const D: usize> core::fmt::Debug for Series<'_, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Series[{}..]", self.offset)
    }
}
