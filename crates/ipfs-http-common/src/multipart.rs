//! `multipart/form-data` bodies for upload endpoints.
//!
//! The daemon reads uploads from parts named `file`. Plain files carry
//! `application/octet-stream`; directories are announced with an empty
//! `application/x-directory` part and their files follow with filenames that
//! are the URL-encoded path relative to the directory's parent.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, TryStreamExt, future, stream};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::io::AsyncReadExt;

use crate::request::EncodeError;

/// Default read/transfer chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Streamed request body.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, EncodeError>> + Send>>;

const FILENAME_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const OCTET_STREAM: &str = "application/octet-stream";
const DIRECTORY: &str = "application/x-directory";

#[derive(Debug, Clone)]
enum Content {
    Empty,
    Bytes(Bytes),
    File(PathBuf),
}

impl Content {
    fn chunks(&self, chunk_size: usize) -> BodyStream {
        match self {
            Content::Empty => Box::pin(stream::empty()),
            Content::Bytes(data) => {
                let mut chunks = Vec::with_capacity(data.len() / chunk_size + 1);
                let mut rest = data.clone();
                while rest.len() > chunk_size {
                    chunks.push(rest.split_to(chunk_size));
                }
                if !rest.is_empty() {
                    chunks.push(rest);
                }
                Box::pin(stream::iter(chunks.into_iter().map(Ok)))
            }
            Content::File(path) => Box::pin(stream::try_unfold(
                (path.clone(), None),
                move |(path, file)| next_file_chunk(path, file, chunk_size),
            )),
        }
    }
}

#[derive(Debug, Clone)]
struct Part {
    filename: Option<String>,
    content_type: &'static str,
    content: Content,
}

impl Part {
    fn head(&self, boundary: &str) -> Bytes {
        let mut head = format!("--{boundary}\r\n");
        match &self.filename {
            Some(name) => head.push_str(&format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n"
            )),
            None => head.push_str("Content-Disposition: form-data; name=\"file\"\r\n"),
        }
        head.push_str(&format!("Content-Type: {}\r\n\r\n", self.content_type));
        Bytes::from(head)
    }
}

/// Builder for a multipart body.
///
/// Files are only checked for existence while building; their content is
/// read when the finished body is streamed.
#[derive(Debug, Clone)]
pub struct Multipart {
    chunk_size: usize,
    boundary: String,
    parts: Vec<Part>,
}

impl Multipart {
    /// Start an empty body. A `chunk_size` of zero falls back to the default.
    pub fn new(chunk_size: usize) -> Self {
        let boundary: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Self::with_boundary(chunk_size, boundary)
    }

    /// Start an empty body with a fixed boundary.
    pub fn with_boundary(chunk_size: usize, boundary: impl Into<String>) -> Self {
        Self {
            chunk_size: if chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                chunk_size
            },
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    fn push(&mut self, filename: Option<String>, content_type: &'static str, content: Content) {
        self.parts.push(Part {
            filename,
            content_type,
            content,
        });
    }

    /// Add an anonymous byte payload.
    pub fn bytes(mut self, data: impl Into<Bytes>) -> Self {
        self.push(None, OCTET_STREAM, Content::Bytes(data.into()));
        self
    }

    /// Add an anonymous text payload, encoded as UTF-8.
    pub fn text(self, text: &str) -> Self {
        self.bytes(Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Add an in-memory payload under the given filename.
    pub fn named_bytes(mut self, filename: &str, data: impl Into<Bytes>) -> Self {
        self.push(
            Some(encode_filename(filename)),
            OCTET_STREAM,
            Content::Bytes(data.into()),
        );
        self
    }

    /// Add a file from disk.
    pub async fn file(mut self, path: impl AsRef<Path>) -> Result<Self, EncodeError> {
        let path = path.as_ref();
        tokio::fs::metadata(path)
            .await
            .map_err(|source| EncodeError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        self.push(
            Some(encode_filename(&file_name(path))),
            OCTET_STREAM,
            Content::File(path.to_path_buf()),
        );
        Ok(self)
    }

    /// Add a directory tree.
    ///
    /// Without `recursive` only the files directly inside `path` are added.
    /// Entries are visited in name order so bodies are deterministic.
    pub async fn directory(
        mut self,
        path: impl AsRef<Path>,
        recursive: bool,
    ) -> Result<Self, EncodeError> {
        let root = path.as_ref();
        let root_name = file_name(root);
        let mut pending = VecDeque::from([(root.to_path_buf(), root_name)]);

        while let Some((dir, rel)) = pending.pop_front() {
            self.push(Some(encode_filename(&rel)), DIRECTORY, Content::Empty);

            let entries = read_dir_sorted(&dir).await?;
            for (entry_path, is_dir) in entries {
                let entry_rel = format!("{rel}/{}", file_name(&entry_path));
                if is_dir {
                    if recursive {
                        pending.push_back((entry_path, entry_rel));
                    }
                    continue;
                }
                self.push(
                    Some(encode_filename(&entry_rel)),
                    OCTET_STREAM,
                    Content::File(entry_path),
                );
            }
        }
        Ok(self)
    }

    /// Number of parts added so far.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Finish the body.
    pub fn finish(self) -> MultipartBody {
        MultipartBody {
            boundary: self.boundary,
            chunk_size: self.chunk_size,
            parts: self.parts,
        }
    }
}

/// A finished multipart body, encoded on demand by [`MultipartBody::stream`].
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    chunk_size: usize,
    parts: Vec<Part>,
}

impl MultipartBody {
    /// Boundary separating the parts.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the body lazily.
    ///
    /// Part headers and terminators are yielded as chunks of their own;
    /// content comes in pieces of at most the configured chunk size, files
    /// being read only as the stream is polled.
    pub fn stream(&self) -> BodyStream {
        let chunk_size = self.chunk_size;
        let boundary = self.boundary.clone();
        let closing = Bytes::from(format!("--{boundary}--\r\n"));
        let body = stream::iter(self.parts.clone())
            .flat_map(move |part| {
                stream::once(future::ready(Ok(part.head(&boundary))))
                    .chain(part.content.chunks(chunk_size))
                    .chain(stream::once(future::ready(Ok(Bytes::from_static(b"\r\n")))))
            })
            .chain(stream::once(future::ready(Ok(closing))));
        Box::pin(body)
    }

    /// Encode the whole body into one buffer.
    pub async fn to_bytes(&self) -> Result<Bytes, EncodeError> {
        self.stream()
            .try_fold(BytesMut::new(), |mut out, chunk| {
                out.extend_from_slice(&chunk);
                future::ready(Ok(out))
            })
            .await
            .map(BytesMut::freeze)
    }
}

type FileChunk = Option<(Bytes, (PathBuf, Option<tokio::fs::File>))>;

async fn next_file_chunk(
    path: PathBuf,
    file: Option<tokio::fs::File>,
    chunk_size: usize,
) -> Result<FileChunk, EncodeError> {
    let io_err = |source| EncodeError::Io {
        path: path.clone(),
        source,
    };
    let mut file = match file {
        Some(file) => file,
        None => tokio::fs::File::open(&path).await.map_err(io_err)?,
    };
    let mut buf = BytesMut::zeroed(chunk_size);
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await.map_err(io_err)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled == 0 {
        return Ok(None);
    }
    buf.truncate(filled);
    Ok(Some((buf.freeze(), (path, Some(file)))))
}

fn encode_filename(name: &str) -> String {
    utf8_percent_encode(name, FILENAME_ESCAPE).to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

async fn read_dir_sorted(dir: &Path) -> Result<Vec<(PathBuf, bool)>, EncodeError> {
    let io_err = |source| EncodeError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut reader = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(io_err)? {
        let is_dir = entry.file_type().await.map_err(io_err)?.is_dir();
        entries.push((entry.path(), is_dir));
    }
    entries.sort();
    Ok(entries)
}
