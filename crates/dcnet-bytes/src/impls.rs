//! Implementations of [`Readable`] and [`Writeable`] for a handful of
//! primitive types used throughout the cell and wire-format codecs.

use crate::{EncodeResult, Readable, Reader, Result, Writeable, Writer};

impl Writeable for u8 {
    fn write_onto<B: Writer + ?Sized>(&self, b: &mut B) -> EncodeResult<()> {
        b.write_u8(*self);
        Ok(())
    }
}
impl Writeable for u16 {
    fn write_onto<B: Writer + ?Sized>(&self, b: &mut B) -> EncodeResult<()> {
        b.write_u16(*self);
        Ok(())
    }
}
impl Writeable for u32 {
    fn write_onto<B: Writer + ?Sized>(&self, b: &mut B) -> EncodeResult<()> {
        b.write_u32(*self);
        Ok(())
    }
}
impl Writeable for u64 {
    fn write_onto<B: Writer + ?Sized>(&self, b: &mut B) -> EncodeResult<()> {
        b.write_u64(*self);
        Ok(())
    }
}
impl Writeable for [u8] {
    fn write_onto<B: Writer + ?Sized>(&self, b: &mut B) -> EncodeResult<()> {
        b.write_all(self);
        Ok(())
    }
}
impl<const N: usize> Writeable for [u8; N] {
    fn write_onto<B: Writer + ?Sized>(&self, b: &mut B) -> EncodeResult<()> {
        b.write_all(&self[..]);
        Ok(())
    }
}

impl<const N: usize> Readable for [u8; N] {
    fn take_from(b: &mut Reader<'_>) -> Result<Self> {
        let mut out = [0_u8; N];
        b.take_into(&mut out)?;
        Ok(out)
    }
}

impl Readable for u8 {
    fn take_from(b: &mut Reader<'_>) -> Result<Self> {
        b.take_u8()
    }
}
impl Readable for u16 {
    fn take_from(b: &mut Reader<'_>) -> Result<Self> {
        b.take_u16()
    }
}
impl Readable for u32 {
    fn take_from(b: &mut Reader<'_>) -> Result<Self> {
        b.take_u32()
    }
}
impl Readable for u64 {
    fn take_from(b: &mut Reader<'_>) -> Result<Self> {
        b.take_u64()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip_array() {
        let mut v = Vec::new();
        v.write(&[1_u8, 2, 3, 4]).unwrap();
        let mut r = Reader::from_slice(&v);
        let arr: [u8; 4] = r.extract().unwrap();
        assert_eq!(arr, [1, 2, 3, 4]);
    }

    #[test]
    fn invalid_message_display() {
        let e = Error::InvalidMessage("bad header".into());
        assert_eq!(e.to_string(), "Bad object: bad header");
    }
}
