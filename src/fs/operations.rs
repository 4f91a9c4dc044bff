use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Moves backwards in a file to beginning of a previous line.
/// Used to get at the last record of an append-only log without reading all of it.
pub async fn seek_line_backwards(
    file: &mut (impl AsyncSeek + AsyncRead + Unpin),
    buffer: &mut [u8],
) -> Result<(), io::Error> {
    // The newline right before the current position belongs to the line we are leaving.
    // For example: need_to_read_this\nwe_are_here_now\n
    let mut need_to_skip = 1usize;
    loop {
        let leftover = file.stream_position().await?;
        if leftover == 0 {
            return Ok(());
        }
        let next_chunk = u64::min(leftover, buffer.len() as u64) as usize;
        file.seek(std::io::SeekFrom::Current(-(next_chunk as i64)))
            .await?;

        file.read_exact(&mut buffer[..next_chunk]).await?;
        let iter = buffer[..next_chunk].iter().rev().enumerate();
        let iter = iter.skip(need_to_skip);
        for (index, value) in iter {
            if *value == b'\n' {
                file.seek(std::io::SeekFrom::Current(-(index as i64)))
                    .await?;
                return Ok(());
            }
        }

        need_to_skip = need_to_skip.saturating_sub(1);
        file.seek(std::io::SeekFrom::Current(-(next_chunk as i64)))
            .await?;
    }
}

/// Reads the last non-empty line of a file, without the trailing newline.
pub async fn read_last_line(
    file: &mut (impl AsyncSeek + AsyncRead + Unpin),
) -> Result<Option<String>, io::Error> {
    file.seek(std::io::SeekFrom::End(0)).await?;
    seek_line_backwards(file, &mut vec![0; 1024]).await?;
    let mut last_line = String::new();
    file.read_to_string(&mut last_line).await?;
    let last_line = last_line.trim();
    if last_line.is_empty() {
        Ok(None)
    } else {
        Ok(Some(last_line.to_string()))
    }
}
