//! Pack index (v1 and v2) reading and lookup.
//!
//! The pack index provides fast OID → offset mapping using a fan-out table
//! and binary search.
//!
//! Version is inferred from the first four bytes: `\xff tOc` (0xff744f63)
//! means v2, with a following version word that must equal 2; anything else
//! is read as a raw v1 fan-out table.
//!
//! v2 format:
//! ```text
//! Header:  \xff tOc (4 bytes) | version (4 bytes = 2)
//! Fanout:  256 × 4-byte big-endian cumulative counts
//! OIDs:    N × 20-byte sorted OIDs
//! CRC32:   N × 4-byte CRC32 values
//! Offsets: N × 4-byte offsets (high bit = 1 → use 64-bit table)
//! 64-bit:  M × 8-byte offsets (for packs > 2GB)
//! Trailer: 20-byte pack checksum | 20-byte index checksum
//! ```
//!
//! v1 format (no magic, no CRC32 table):
//! ```text
//! Fanout:  256 × 4-byte big-endian cumulative counts
//! Entries: N × (4-byte offset, 20-byte OID) interleaved, sorted by OID
//! Trailer: 20-byte pack checksum | 20-byte index checksum
//! ```
//! v1 has no 64-bit offset extension; offsets beyond 2^31-1 cannot be
//! represented and a v1 index containing one is treated as corrupt.

use std::path::{Path, PathBuf};

use git_hash::{ObjectId, DIGEST_LEN};
use memmap2::Mmap;

use crate::{PackError, IDX_SIGNATURE, IDX_VERSION};

const V1_ENTRY_SIZE: usize = 4 + DIGEST_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexVersion {
    V1,
    V2,
}

/// Pack index providing OID → offset mapping, v1 or v2.
pub struct PackIndex {
    data: Mmap,
    version: IndexVersion,
    num_objects: u32,
    /// Byte offset where the fanout table starts.
    fanout_offset: usize,
    /// v1 only: byte offset where interleaved (offset, OID) entries start.
    entry_offset: usize,
    /// v2 only: byte offset where sorted OIDs start.
    oid_offset: usize,
    /// v2 only: byte offset where CRC32 values start.
    crc_offset: usize,
    /// v2 only: byte offset where 32-bit offsets start.
    offset32_offset: usize,
    /// v2 only: byte offset where 64-bit offsets start (if any).
    offset64_offset: usize,
    /// Path to the .idx file.
    idx_path: PathBuf,
}

impl PackIndex {
    /// Open a pack index file, auto-detecting v1 vs v2.
    pub fn open(idx_path: impl AsRef<Path>) -> Result<Self, PackError> {
        let idx_path = idx_path.as_ref().to_path_buf();
        let file = std::fs::File::open(&idx_path)?;
        let data = unsafe { Mmap::map(&file)? };

        if data.len() < 4 {
            return Err(PackError::InvalidIndex("file too small".into()));
        }

        if data[0..4] == IDX_SIGNATURE {
            Self::open_v2(data, idx_path)
        } else {
            Self::open_v1(data, idx_path)
        }
    }

    fn open_v2(data: Mmap, idx_path: PathBuf) -> Result<Self, PackError> {
        if data.len() < 8 + 1024 + 2 * DIGEST_LEN {
            return Err(PackError::InvalidIndex("file too small".into()));
        }

        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version != IDX_VERSION {
            return Err(PackError::InvalidIndex(format!(
                "unsupported version {version}, expected {IDX_VERSION}"
            )));
        }

        let fanout_offset = 8;
        let num_objects = read_u32(&data, fanout_offset + 255 * 4);

        let n = num_objects as usize;
        let oid_offset = fanout_offset + 1024;
        let crc_offset = oid_offset + n * DIGEST_LEN;
        let offset32_offset = crc_offset + n * 4;
        let offset64_offset = offset32_offset + n * 4;

        let min_size = offset64_offset + 2 * DIGEST_LEN;
        if data.len() < min_size {
            return Err(PackError::InvalidIndex(format!(
                "file too small: {} < {min_size}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            version: IndexVersion::V2,
            num_objects,
            fanout_offset,
            entry_offset: 0,
            oid_offset,
            crc_offset,
            offset32_offset,
            offset64_offset,
            idx_path,
        })
    }

    fn open_v1(data: Mmap, idx_path: PathBuf) -> Result<Self, PackError> {
        if data.len() < 1024 + 2 * DIGEST_LEN {
            return Err(PackError::InvalidIndex("file too small".into()));
        }

        let fanout_offset = 0;
        let num_objects = read_u32(&data, fanout_offset + 255 * 4);

        let n = num_objects as usize;
        let entry_offset = fanout_offset + 1024;
        let min_size = entry_offset + n * V1_ENTRY_SIZE + 2 * DIGEST_LEN;
        if data.len() < min_size {
            return Err(PackError::InvalidIndex(format!(
                "file too small: {} < {min_size}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            version: IndexVersion::V1,
            num_objects,
            fanout_offset,
            entry_offset,
            oid_offset: 0,
            crc_offset: 0,
            offset32_offset: 0,
            offset64_offset: 0,
            idx_path,
        })
    }

    /// Look up an OID, returning the offset in the pack file.
    pub fn lookup(&self, oid: &ObjectId) -> Option<u64> {
        let (lo, hi) = self.fanout_range(oid.first_byte());
        if lo >= hi {
            return None;
        }
        let target: &[u8] = oid.as_bytes().as_slice();

        let mut low = lo;
        let mut high = hi;
        while low < high {
            let mid = low + (high - low) / 2;
            let mid_oid = self.oid_bytes_at(mid);
            match mid_oid.cmp(target) {
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid,
                std::cmp::Ordering::Equal => {
                    return Some(self.offset_at_index(mid as u32));
                }
            }
        }
        None
    }

    /// Look up by OID prefix, returning all matches as (OID, offset) pairs.
    pub fn lookup_prefix(&self, prefix: &[u8]) -> Vec<(ObjectId, u64)> {
        if prefix.is_empty() {
            return Vec::new();
        }

        let first_byte = prefix[0];
        let (lo, hi) = self.fanout_range(first_byte);

        let mut results = Vec::new();
        for i in lo..hi {
            let oid_bytes = self.oid_bytes_at(i);
            if oid_bytes.len() >= prefix.len() && oid_bytes[..prefix.len()] == *prefix {
                if let Ok(oid) = ObjectId::from_bytes(oid_bytes) {
                    results.push((oid, self.offset_at_index(i as u32)));
                }
            }
        }
        results
    }

    /// Get the OID at the given sorted index position.
    pub fn oid_at_index(&self, index: u32) -> ObjectId {
        let bytes = self.oid_bytes_at(index as usize);
        ObjectId::from_bytes(bytes).expect("valid OID in index")
    }

    /// Get the pack file offset at the given sorted index position.
    pub fn offset_at_index(&self, index: u32) -> u64 {
        match self.version {
            IndexVersion::V1 => {
                let pos = self.entry_offset + index as usize * V1_ENTRY_SIZE;
                read_u32(&self.data, pos) as u64
            }
            IndexVersion::V2 => {
                let pos = self.offset32_offset + index as usize * 4;
                let val = read_u32(&self.data, pos);
                if val & 0x8000_0000 != 0 {
                    let idx64 = (val & 0x7FFF_FFFF) as usize;
                    let pos64 = self.offset64_offset + idx64 * 8;
                    u64::from_be_bytes(self.data[pos64..pos64 + 8].try_into().unwrap())
                } else {
                    val as u64
                }
            }
        }
    }

    /// Get the CRC32 at the given sorted index position.
    ///
    /// Returns `None` for a v1-backed index, which has no per-entry CRC32.
    pub fn crc32_at_index(&self, index: u32) -> Option<u32> {
        match self.version {
            IndexVersion::V1 => None,
            IndexVersion::V2 => {
                let pos = self.crc_offset + index as usize * 4;
                Some(read_u32(&self.data, pos))
            }
        }
    }

    /// Total number of objects in this index.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Index version (1 or 2).
    pub fn version(&self) -> u32 {
        match self.version {
            IndexVersion::V1 => 1,
            IndexVersion::V2 => 2,
        }
    }

    /// Path to the .idx file.
    pub fn path(&self) -> &Path {
        &self.idx_path
    }

    /// Pack checksum stored in the index trailer.
    pub fn pack_checksum(&self) -> ObjectId {
        let start = self.data.len() - 2 * DIGEST_LEN;
        ObjectId::from_bytes(&self.data[start..start + DIGEST_LEN])
            .expect("valid checksum in index trailer")
    }

    /// Index checksum (the trailing hash of the index file itself).
    pub fn index_checksum(&self) -> ObjectId {
        let start = self.data.len() - DIGEST_LEN;
        ObjectId::from_bytes(&self.data[start..start + DIGEST_LEN])
            .expect("valid checksum in index trailer")
    }

    /// Iterate over all (OID, offset) pairs in sorted order.
    pub fn iter(&self) -> PackIndexIter<'_> {
        PackIndexIter {
            index: self,
            pos: 0,
        }
    }

    /// Get the fan-out range for a given first byte.
    /// Returns (start, end) indices into the sorted OID list.
    fn fanout_range(&self, first_byte: u8) -> (usize, usize) {
        let end = self.fanout_entry(first_byte) as usize;
        let start = if first_byte == 0 {
            0
        } else {
            self.fanout_entry(first_byte - 1) as usize
        };
        (start, end)
    }

    /// Read a single fanout table entry.
    fn fanout_entry(&self, index: u8) -> u32 {
        read_u32(&self.data, self.fanout_offset + index as usize * 4)
    }

    /// Raw OID bytes at the given sorted index position.
    fn oid_bytes_at(&self, index: usize) -> &[u8] {
        match self.version {
            IndexVersion::V1 => {
                let start = self.entry_offset + index * V1_ENTRY_SIZE + 4;
                &self.data[start..start + DIGEST_LEN]
            }
            IndexVersion::V2 => {
                let start = self.oid_offset + index * DIGEST_LEN;
                &self.data[start..start + DIGEST_LEN]
            }
        }
    }
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap())
}

/// Iterator over (OID, offset) pairs in a pack index.
pub struct PackIndexIter<'a> {
    index: &'a PackIndex,
    pos: u32,
}

impl<'a> Iterator for PackIndexIter<'a> {
    type Item = (ObjectId, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.index.num_objects {
            return None;
        }
        let oid = self.index.oid_at_index(self.pos);
        let offset = self.index.offset_at_index(self.pos);
        self.pos += 1;
        Some((oid, offset))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.index.num_objects - self.pos) as usize;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for PackIndexIter<'a> {}
