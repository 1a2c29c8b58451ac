use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::Utf8Error;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// File bytes, either mapped or read into memory.
pub enum FileContent {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl FileContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Mapped(mmap) => &mmap[..],
            FileContent::Buffered(buf) => buf.as_slice(),
        }
    }

    /// Borrow the content as text, failing on invalid UTF-8.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }
}

/// Read a file, memory-mapping it above [`MMAP_THRESHOLD`].
pub fn read_file_smart<P: AsRef<Path>>(path: P) -> io::Result<FileContent> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)?;

    if metadata.len() > MMAP_THRESHOLD {
        let file = File::open(path)?;

        // SAFETY: read-only map; the walker owns this path for the lifetime of the map
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(FileContent::Mapped(mmap))
    } else {
        Ok(FileContent::Buffered(std::fs::read(path)?))
    }
}

/// Split text into lines the way a line scanner does: `\n` terminated,
/// a trailing `\r` dropped, no empty line after a final newline.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Join lines with `\n`, appending a final newline when requested.
pub fn join_lines<S: AsRef<str>>(lines: &[S], final_newline: bool) -> String {
    let cap = lines.iter().map(|l| l.as_ref().len() + 1).sum::<usize>();
    let mut out = String::with_capacity(cap);

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.as_ref());
    }

    if final_newline && !lines.is_empty() {
        out.push('\n');
    }

    out
}

/// Whether joining should re-append a final newline for `original`.
pub fn wants_final_newline(original: &str, keep_final_newline: bool) -> bool {
    keep_final_newline && original.ends_with('\n')
}
