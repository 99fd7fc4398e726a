use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use failure::{format_err, Error};
use log::warn;
use sha2::{Digest, Sha224};

#[derive(Clone, Debug)]
struct PatchEntry {
    data: Vec<u8>,
    expected: Option<Vec<u8>>,
    description: Option<String>,
}

/// An accumulating set of address -> bytes edits for one seed.  Addresses are
/// file offsets; entries at the same address overwrite each other, and
/// merging two patches lets the right-hand side win.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    entries: BTreeMap<usize, PatchEntry>,
}

impl Patch {
    pub fn new() -> Patch {
        Patch::default()
    }

    pub fn add(&mut self, addr: usize, data: Vec<u8>) {
        self.add_with_context(addr, data, None, None);
    }

    pub fn add_with_context(
        &mut self,
        addr: usize,
        data: Vec<u8>,
        expected: Option<Vec<u8>>,
        description: Option<&str>,
    ) {
        self.entries.insert(
            addr,
            PatchEntry {
                data,
                expected,
                description: description.map(String::from),
            },
        );
    }

    /// Accepts a whitespace-tolerant hex string, e.g. "FF95 ACCAD0FB".
    pub fn add_from_hex_string(&mut self, addr: usize, hex: &str) -> Result<(), Error> {
        let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() % 2 != 0 {
            return Err(format_err!("odd-length hex string: {:?}", hex));
        }
        let mut data = Vec::with_capacity(digits.len() / 2);
        for chunk in digits.as_bytes().chunks(2) {
            let byte_str = std::str::from_utf8(chunk)?;
            let byte = u8::from_str_radix(byte_str, 16)
                .map_err(|_| format_err!("invalid hex byte {:?} in {:?}", byte_str, hex))?;
            data.push(byte);
        }
        self.add(addr, data);
        Ok(())
    }

    /// Reads an International Patching System file and merges its hunks.
    pub fn add_from_ips(&mut self, path: &Path) -> Result<(), Error> {
        let data = fs::read(path)
            .map_err(|e| format_err!("unable to read IPS overlay {}: {}", path.display(), e))?;
        let ips_patch = ips::Patch::parse(&data)
            .map_err(|e| format_err!("unable to parse IPS overlay {}: {}", path.display(), e))?;
        for hunk in ips_patch.hunks() {
            self.add(hunk.offset(), hunk.payload().to_vec());
        }
        Ok(())
    }

    /// Writes every entry into the buffer.  When an entry carries expected
    /// original bytes and the buffer disagrees, a warning is logged and the
    /// patch is applied anyway.
    pub fn apply(&self, rom: &mut [u8]) {
        for (&addr, entry) in &self.entries {
            if addr + entry.data.len() > rom.len() {
                warn!(
                    "patch at {:#06x} ({} bytes) extends past the end of the image; skipped",
                    addr,
                    entry.data.len()
                );
                continue;
            }
            if let Some(expected) = &entry.expected {
                let actual = &rom[addr..addr + expected.len().min(rom.len() - addr)];
                if actual != expected.as_slice() {
                    warn!(
                        "expected data mismatch at {:#06x}{}: expected {:02x?}, found {:02x?}, patching with {:02x?}",
                        addr,
                        entry
                            .description
                            .as_ref()
                            .map(|d| format!(" ({})", d))
                            .unwrap_or_default(),
                        expected,
                        actual,
                        entry.data
                    );
                }
            }
            rom[addr..addr + entry.data.len()].copy_from_slice(&entry.data);
        }
    }

    /// Union with another patch; `other`'s entries win on address collision,
    /// and their descriptions follow them.
    pub fn extend(&mut self, other: Patch) {
        for (addr, entry) in other.entries {
            self.entries.insert(addr, entry);
        }
    }

    pub fn addresses(&self) -> Vec<usize> {
        self.entries.keys().cloned().collect()
    }

    pub fn data(&self, addr: usize) -> Option<&[u8]> {
        self.entries.get(&addr).map(|e| e.data.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Four-byte fingerprint of the patch set, shown on the title screen.
    /// Each output byte is masked to the 5-bit ROM character space; three
    /// codes that render as glitch tiles are remapped to clean icons.
    pub fn hash_code(&self) -> [u8; 4] {
        let mut hasher = Sha224::new();
        // BTreeMap iteration is already address-sorted.
        for (addr, entry) in &self.entries {
            hasher.update(addr.to_string().as_bytes());
            hasher.update(&entry.data);
        }
        let digest = hasher.finalize();
        let mut code = [0u8; 4];
        for (out, byte) in code.iter_mut().zip(digest.iter()) {
            *out = match byte & 0x1f {
                0x0e => 0x21,
                0x02 => 0x22,
                0x07 => 0x23,
                val => val,
            };
        }
        code
    }

    pub fn for_json(&self) -> serde_json::Value {
        let mut entries = Vec::new();
        for (addr, entry) in &self.entries {
            let mut object = serde_json::Map::new();
            object.insert(
                addr.to_string(),
                serde_json::Value::from(entry.data.clone()),
            );
            entries.push(serde_json::Value::Object(object));
        }
        serde_json::Value::Array(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_overwrites_prior_entry() {
        let mut patch = Patch::new();
        patch.add(0x10, vec![0x01, 0x02]);
        patch.add(0x10, vec![0x03]);
        assert_eq!(patch.data(0x10), Some(&[0x03][..]));
        assert_eq!(patch.len(), 1);
    }

    #[test]
    fn hex_string_tolerates_whitespace() {
        let mut patch = Patch::new();
        patch
            .add_from_hex_string(0x20, "FF95 ACCA\nD0FB")
            .unwrap();
        assert_eq!(
            patch.data(0x20),
            Some(&[0xff, 0x95, 0xac, 0xca, 0xd0, 0xfb][..])
        );
    }

    #[test]
    fn hex_string_rejects_bad_input() {
        let mut patch = Patch::new();
        assert!(patch.add_from_hex_string(0, "ABC").is_err());
        assert!(patch.add_from_hex_string(0, "GG").is_err());
    }

    #[test]
    fn extend_lets_right_side_win() {
        let mut a = Patch::new();
        a.add(0x10, vec![0x01]);
        a.add(0x20, vec![0x02]);
        let mut b = Patch::new();
        b.add(0x10, vec![0xff]);
        a.extend(b);
        assert_eq!(a.data(0x10), Some(&[0xff][..]));
        assert_eq!(a.data(0x20), Some(&[0x02][..]));
    }

    #[test]
    fn apply_writes_bytes() {
        let mut patch = Patch::new();
        patch.add(2, vec![0xaa, 0xbb]);
        let mut rom = vec![0u8; 8];
        patch.apply(&mut rom);
        assert_eq!(rom, vec![0, 0, 0xaa, 0xbb, 0, 0, 0, 0]);
    }

    #[test]
    fn apply_proceeds_on_expected_mismatch() {
        let mut patch = Patch::new();
        patch.add_with_context(0, vec![0x11], Some(vec![0x99]), Some("test edit"));
        let mut rom = vec![0u8; 4];
        patch.apply(&mut rom);
        assert_eq!(rom[0], 0x11);
    }

    #[test]
    fn apply_expected_noop_patch_is_identity() {
        let mut rom: Vec<u8> = (0..16).collect();
        let original = rom.clone();
        let mut patch = Patch::new();
        for (addr, &byte) in original.iter().enumerate() {
            patch.add_with_context(addr, vec![byte], Some(vec![byte]), None);
        }
        patch.apply(&mut rom);
        assert_eq!(rom, original);
    }

    #[test]
    fn hash_code_is_deterministic_and_order_independent() {
        let mut a = Patch::new();
        a.add(0x200, vec![1, 2, 3]);
        a.add(0x100, vec![4]);
        let mut b = Patch::new();
        b.add(0x100, vec![4]);
        b.add(0x200, vec![1, 2, 3]);
        assert_eq!(a.hash_code(), b.hash_code());
    }

    #[test]
    fn hash_code_avoids_glitch_values() {
        let mut patch = Patch::new();
        for seed in 0..64usize {
            patch.add(seed, vec![seed as u8]);
            for &byte in patch.hash_code().iter() {
                assert_ne!(byte, 0x0e);
                assert_ne!(byte, 0x02);
                assert_ne!(byte, 0x07);
                assert!(byte <= 0x23);
            }
        }
    }

    #[test]
    fn ips_round_trip() {
        // PATCH, one record at 0x000010 of 2 bytes, one RLE record at
        // 0x000020 of 3x 0x5a, EOF.
        let mut ips_data = Vec::new();
        ips_data.extend_from_slice(b"PATCH");
        ips_data.extend_from_slice(&[0x00, 0x00, 0x10, 0x00, 0x02, 0xde, 0xad]);
        ips_data.extend_from_slice(&[0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x03, 0x5a]);
        ips_data.extend_from_slice(b"EOF");

        let dir = std::env::temp_dir();
        let path = dir.join("zelda1_patch_test.ips");
        fs::write(&path, &ips_data).unwrap();

        let mut patch = Patch::new();
        patch.add_from_ips(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(patch.data(0x10), Some(&[0xde, 0xad][..]));
        assert_eq!(patch.data(0x20), Some(&[0x5a, 0x5a, 0x5a][..]));
    }

    #[test]
    fn for_json_is_sorted_by_address() {
        let mut patch = Patch::new();
        patch.add(0x300, vec![3]);
        patch.add(0x100, vec![1]);
        let value = patch.for_json();
        let list = value.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].get("256").is_some());
        assert!(list[1].get("768").is_some());
    }
}
