//! # Package Container
//!
//! The zip archive a `.docx` file actually is. Parts are added by name and
//! serialized into a complete archive: local file headers, entry payloads,
//! central directory, end-of-central-directory record. XML parts are
//! deflated; image media is stored as-is since it is already compressed.
//! Entry timestamps are pinned to the DOS epoch so identical inputs produce
//! identical archives.

use miniz_oxide::deflate::compress_to_vec;

/// DOS date 1980-01-01, the earliest the field can encode.
const DOS_EPOCH_DATE: u16 = 0x0021;
const DOS_EPOCH_TIME: u16 = 0;

/// Version 2.0, the minimum that supports deflate.
const ZIP_VERSION: u16 = 20;

const DEFLATE_LEVEL: u8 = 6;

/// How an entry's payload is stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Deflated,
    Stored,
}

/// One named part of the package.
#[derive(Debug, Clone)]
pub struct Part {
    /// Entry name with forward slashes and no leading slash,
    /// e.g. `word/document.xml`.
    pub name: String,
    pub data: Vec<u8>,
    pub compression: Compression,
}

/// An in-memory package being assembled. Parts keep insertion order, which
/// becomes entry order in the archive.
#[derive(Debug, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn add_part(&mut self, name: &str, data: Vec<u8>, compression: Compression) {
        self.parts.push(Part {
            name: name.to_string(),
            data,
            compression,
        });
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Serialize the archive.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut directory = Vec::new();

        for part in &self.parts {
            let crc = crc32(&part.data);
            let (method, payload) = match part.compression {
                Compression::Deflated => (8u16, compress_to_vec(&part.data, DEFLATE_LEVEL)),
                Compression::Stored => (0u16, part.data.clone()),
            };
            let offset = out.len() as u32;
            let name = part.name.as_bytes();

            // Local file header.
            put_u32(&mut out, 0x04034b50);
            put_u16(&mut out, ZIP_VERSION);
            put_u16(&mut out, 0); // flags
            put_u16(&mut out, method);
            put_u16(&mut out, DOS_EPOCH_TIME);
            put_u16(&mut out, DOS_EPOCH_DATE);
            put_u32(&mut out, crc);
            put_u32(&mut out, payload.len() as u32);
            put_u32(&mut out, part.data.len() as u32);
            put_u16(&mut out, name.len() as u16);
            put_u16(&mut out, 0); // extra field length
            out.extend_from_slice(name);
            out.extend_from_slice(&payload);

            // Matching central directory record.
            put_u32(&mut directory, 0x02014b50);
            put_u16(&mut directory, ZIP_VERSION); // version made by
            put_u16(&mut directory, ZIP_VERSION); // version needed
            put_u16(&mut directory, 0); // flags
            put_u16(&mut directory, method);
            put_u16(&mut directory, DOS_EPOCH_TIME);
            put_u16(&mut directory, DOS_EPOCH_DATE);
            put_u32(&mut directory, crc);
            put_u32(&mut directory, payload.len() as u32);
            put_u32(&mut directory, part.data.len() as u32);
            put_u16(&mut directory, name.len() as u16);
            put_u16(&mut directory, 0); // extra field length
            put_u16(&mut directory, 0); // comment length
            put_u16(&mut directory, 0); // disk number start
            put_u16(&mut directory, 0); // internal attributes
            put_u32(&mut directory, 0); // external attributes
            put_u32(&mut directory, offset);
            directory.extend_from_slice(name);
        }

        let directory_offset = out.len() as u32;
        out.extend_from_slice(&directory);

        // End of central directory.
        put_u32(&mut out, 0x06054b50);
        put_u16(&mut out, 0); // this disk
        put_u16(&mut out, 0); // directory start disk
        put_u16(&mut out, self.parts.len() as u16);
        put_u16(&mut out, self.parts.len() as u16);
        put_u32(&mut out, directory.len() as u32);
        put_u32(&mut out, directory_offset);
        put_u16(&mut out, 0); // comment length

        out
    }
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// CRC-32 over the uncompressed entry bytes.
fn crc32(data: &[u8]) -> u32 {
    let mut c = 0xFFFF_FFFFu32;
    for &b in data {
        c = CRC_TABLE[((c ^ b as u32) & 0xFF) as usize] ^ (c >> 8);
    }
    c ^ 0xFFFF_FFFF
}
