use tokio::io::{self, AsyncWrite, AsyncWriteExt};

use crate::record::LogRecord;

pub struct RecordWriter<W> {
    wrt: W,
    buffer: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> RecordWriter<W> {
    pub fn open(wrt: W) -> Self {
        RecordWriter {
            wrt,
            buffer: Vec::with_capacity(10_000),
        }
    }

    /// Writes a record and hands it over to the OS.
    ///
    /// Even if this call returns `Ok(())`, at this point the data
    /// is likely to be not durably stored on disk. See `sync`.
    pub async fn write_record(&mut self, record: &LogRecord<'_>) -> io::Result<()> {
        record.serialize(&mut self.buffer);
        self.wrt.write_all(&self.buffer).await?;
        self.wrt.flush().await?;
        Ok(())
    }
}

impl RecordWriter<tokio::fs::File> {
    /// Forces the written records to stable storage.
    pub async fn sync(&mut self) -> io::Result<()> {
        self.wrt.sync_data().await
    }
}
