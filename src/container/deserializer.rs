use crate::config::{HEADER_SIZE, NONCE_SIZE, SALT_SIZE};
use crate::container::Container;
use crate::error::{Error, Result};

impl<'a> Container<'a> {
    /// Parses container bytes without copying the ciphertext.
    ///
    /// The filename is decoded leniently; everything after it, possibly
    /// nothing, is the ciphertext.
    ///
    /// # Errors
    ///
    /// [`Error::TruncatedHeader`] when `bytes` is shorter than the 30-byte
    /// prefix, [`Error::TruncatedFilename`] when the declared filename length
    /// runs past the end of `bytes`.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let (header, rest) = bytes.split_first_chunk::<HEADER_SIZE>().ok_or(Error::TruncatedHeader)?;

        let (salt, tail) = header.split_first_chunk::<SALT_SIZE>().ok_or(Error::TruncatedHeader)?;
        let (nonce, len) = tail.split_first_chunk::<NONCE_SIZE>().ok_or(Error::TruncatedHeader)?;
        let len: [u8; 2] = len.try_into().map_err(|_| Error::TruncatedHeader)?;
        let name_len = usize::from(u16::from_be_bytes(len));

        if name_len > rest.len() {
            return Err(Error::TruncatedFilename);
        }
        let (name, ciphertext) = rest.split_at(name_len);

        Ok(Self { salt: *salt, nonce: *nonce, filename: String::from_utf8_lossy(name), ciphertext })
    }
}
