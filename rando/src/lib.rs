pub mod bait_blocker;
pub mod collector;
pub mod flags;
pub mod hints;
pub mod inventory;
pub mod major;
pub mod minor;
pub mod overworld;
pub mod randomizer;
pub mod solvers;
pub mod validator;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use failure::{format_err, Error};
use log::info;
use regex::Regex;

use crate::flags::parse_flagstring;
use crate::major::ConstraintConflict;
use crate::randomizer::Randomizer;

/// Output name: `{stem}_{seed}_{FLAGS}.nes`.  When the input was itself an
/// upstream-randomized ROM named `{base}_{seed}_{zrflags}`, the upstream
/// flagstring is preserved in the middle.
pub fn build_default_output_name(input_path: &Path, seed: u64, zora_flagstring: &str) -> String {
    let stem = input_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();

    let upstream = Regex::new(r"^(.+)_(\d+)_([0-9A-Za-z!]+)$").unwrap();
    if let Some(captures) = upstream.captures(&stem) {
        let base = &captures[1];
        let zr_flags = &captures[3];
        return format!("{}_{}_{}_{}.nes", base, seed, zr_flags, zora_flagstring);
    }
    format!("{}_{}_{}.nes", stem, seed, zora_flagstring)
}

fn resolve_output_path(
    input_path: &Path,
    seed: u64,
    zora_flagstring: &str,
    output_dir: &Path,
    output_file: Option<&str>,
) -> PathBuf {
    if let Some(name) = output_file {
        let candidate = PathBuf::from(name);
        if candidate.is_absolute() {
            return candidate;
        }
        return output_dir.join(candidate);
    }
    output_dir.join(build_default_output_name(input_path, seed, zora_flagstring))
}

/// Runs the whole pipeline: parse flags, read the ROM, randomize until a
/// valid seed emerges, apply the patch and write the output image.
pub fn run_randomizer(
    seed: u64,
    flagstring: &str,
    input_path: &Path,
    output_dir: &Path,
    output_file: Option<&str>,
) -> Result<PathBuf, Error> {
    let started = Instant::now();

    let (flags, normalized_flagstring) = parse_flagstring(flagstring)?;
    let conflicts = flags.validate();
    if !conflicts.is_empty() {
        return Err(ConstraintConflict { conflicts }.into());
    }

    let rom = fs::read(input_path)
        .map_err(|e| format_err!("unable to read input ROM {}: {}", input_path.display(), e))?;

    info!("input file: {}", input_path.display());
    info!("ZORA seed: {}", seed);
    info!("ZORA flagstring: {}", normalized_flagstring);

    let mut randomizer = Randomizer::new(rom.clone(), seed, flags);
    let patch = randomizer.build_patch()?;

    let mut output = rom;
    patch.apply(&mut output);

    let output_path = resolve_output_path(
        input_path,
        seed,
        &normalized_flagstring,
        output_dir,
        output_file,
    );
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format_err!("unable to create {}: {}", parent.display(), e))?;
    }
    fs::write(&output_path, &output)
        .map_err(|e| format_err!("unable to write {}: {}", output_path.display(), e))?;

    info!("output file: {}", output_path.display());
    info!("generation time: {:.2?}", started.elapsed());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_input_names_append_seed_and_flags() {
        let name = build_default_output_name(Path::new("zelda.nes"), 12345, "HKGB");
        assert_eq!(name, "zelda_12345_HKGB.nes");
    }

    #[test]
    fn upstream_randomized_names_keep_their_flagstring() {
        let name =
            build_default_output_name(Path::new("zelda_987654_VlWgEs9.nes"), 12345, "HKGB");
        assert_eq!(name, "zelda_12345_VlWgEs9_HKGB.nes");
    }

    #[test]
    fn non_numeric_middle_parts_are_not_upstream_names() {
        let name = build_default_output_name(Path::new("my_cool_rom.nes"), 7, "B");
        assert_eq!(name, "my_cool_rom_7_B.nes");
    }

    #[test]
    fn explicit_output_file_wins() {
        let path = resolve_output_path(
            Path::new("zelda.nes"),
            1,
            "B",
            Path::new("outputs"),
            Some("custom.nes"),
        );
        assert_eq!(path, PathBuf::from("outputs/custom.nes"));
    }
}
