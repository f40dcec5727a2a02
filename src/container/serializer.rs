use crate::config::{HEADER_SIZE, MAX_FILENAME_LENGTH};
use crate::container::Container;
use crate::error::{Error, Result};

impl Container<'_> {
    /// Writes `salt || nonce || len(u16 BE) || filename || ciphertext`.
    ///
    /// # Errors
    ///
    /// [`Error::FilenameTooLong`] if the filename no longer fits the length
    /// field, which can only happen after a lossy parse grew it.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let name_len = filename_len(&self.filename)?;
        let mut result = Vec::with_capacity(self.encoded_len());

        result.extend_from_slice(&self.salt);
        result.extend_from_slice(&self.nonce);
        result.extend_from_slice(&name_len.to_be_bytes());
        result.extend_from_slice(self.filename.as_bytes());
        result.extend_from_slice(self.ciphertext);

        debug_assert_eq!(result.len(), HEADER_SIZE + self.filename.len() + self.ciphertext.len());
        Ok(result)
    }
}

/// Byte length of `filename` as the 16-bit header field.
pub(super) fn filename_len(filename: &str) -> Result<u16> {
    let len = filename.len();
    if len > MAX_FILENAME_LENGTH {
        return Err(Error::FilenameTooLong { len });
    }
    u16::try_from(len).map_err(|_| Error::FilenameTooLong { len })
}
