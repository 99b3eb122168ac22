use std::io::{self, ErrorKind, Read, Write};

/// Largest number of bytes pulled from a stream by a single [`read_chunk`].
pub const READ_CHUNK_CAP: usize = 16 * 1024 * 1024;

/// Performs one read of at most `cap` bytes and returns what was read.
///
/// The buffer is trimmed to the number of bytes actually read, so an empty
/// result means end of stream. Interrupted reads are retried.
pub fn read_chunk<R: Read + ?Sized>(reader: &mut R, cap: usize) -> io::Result<Vec<u8>> {
    let mut buffer = vec![0u8; cap.max(1)];
    let bytes_read = loop {
        match reader.read(&mut buffer) {
            Ok(n) => break n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    };
    buffer.truncate(bytes_read);
    Ok(buffer)
}

/// Writes the whole buffer and hands it back unchanged.
///
/// `write` may accept fewer bytes than offered, so this loops until the
/// buffer is drained. A writer that accepts nothing yields
/// [`ErrorKind::WriteZero`].
pub fn write_chunk<W: Write + ?Sized>(writer: &mut W, buffer: Vec<u8>) -> io::Result<Vec<u8>> {
    let mut written = 0;
    while written < buffer.len() {
        match writer.write(&buffer[written..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    format!("short write: {written} of {} bytes", buffer.len()),
                ));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(buffer)
}
