use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::BodyError;

/// Charset a [`read_token`] caller expects the line to be decoded with.
///
/// Request/status/header lines are ISO-8859-1 per RFC9112; form bodies are UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// ISO-8859-1: every byte maps losslessly to the codepoint of the same value.
    Latin1,
    /// UTF-8, decoded lossily (invalid sequences become `U+FFFD`).
    Utf8,
}

/// Read bytes from `reader` until `delimiter` is seen or, if `delimiter` is `None`,
/// until end-of-stream. Fails with [`BodyError::TokenTooLarge`] once the accumulated
/// length would exceed `max_len`. When `delimiter` is `Some(b'\n')` and the byte just
/// before it is `b'\r'`, the `\r` is stripped from the result.
///
/// End-of-stream before the delimiter is an error unless `delimiter` is `None`.
pub async fn read_token<R: AsyncRead + Unpin>(
    reader: &mut R,
    delimiter: Option<u8>,
    max_len: usize,
    charset: Charset,
) -> Result<String, BodyError> {
    let mut buf = Vec::new();
    loop {
        let byte = match reader.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                if delimiter.is_none() {
                    break;
                }
                return Err(BodyError::UnexpectedEof);
            }
            Err(e) => return Err(BodyError::Io(e)),
        };

        if delimiter == Some(byte) {
            if byte == b'\n' && buf.last() == Some(&b'\r') {
                buf.pop();
            }
            break;
        }

        buf.push(byte);
        if buf.len() > max_len {
            return Err(BodyError::TokenTooLarge);
        }
    }
    Ok(decode(&buf, charset))
}

/// Read a single CRLF- or LF-terminated line, in the given charset, capped at `max_len`.
#[inline]
pub async fn read_line<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_len: usize,
    charset: Charset,
) -> Result<String, BodyError> {
    read_token(reader, Some(b'\n'), max_len, charset).await
}

fn decode(bytes: &[u8], charset: Charset) -> String {
    match charset {
        Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn strips_trailing_cr() {
        let mut input: &[u8] = b"hello\r\nworld";
        let line = read_line(&mut input, 1024, Charset::Latin1).await.unwrap();
        assert_eq!(line, "hello");
    }

    #[tokio::test]
    async fn fails_when_too_large() {
        let mut input: &[u8] = b"0123456789\n";
        let err = read_line(&mut input, 4, Charset::Latin1).await.unwrap_err();
        assert!(matches!(err, BodyError::TokenTooLarge));
    }

    #[tokio::test]
    async fn eof_without_delimiter_is_not_an_error() {
        let mut input: &[u8] = b"no newline here";
        let tail = read_token(&mut input, None, 1024, Charset::Latin1).await.unwrap();
        assert_eq!(tail, "no newline here");
    }

    #[tokio::test]
    async fn eof_before_delimiter_fails() {
        let mut input: &[u8] = b"truncated";
        let err = read_line(&mut input, 1024, Charset::Latin1).await.unwrap_err();
        assert!(matches!(err, BodyError::UnexpectedEof));
    }

    #[tokio::test]
    async fn latin1_is_lossless_per_byte() {
        let mut input: &[u8] = &[0xE9, b'\n']; // é in latin1, invalid utf-8 alone
        let line = read_line(&mut input, 1024, Charset::Latin1).await.unwrap();
        assert_eq!(line.chars().next().unwrap() as u32, 0xE9);
    }
}
