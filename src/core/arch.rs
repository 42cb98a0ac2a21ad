//! Architecture identifiers and their Meson machine descriptions.

use std::fmt;

use crate::builder::errors::MesonError;

/// Byte order of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Token used by Meson machine files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endianness::Little => "little",
            Endianness::Big => "big",
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meson's description of a CPU: `cpu_family`, `cpu` and `endian`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuTriple {
    pub cpu_family: &'static str,
    pub cpu: &'static str,
    pub endian: Endianness,
}

const fn triple(cpu_family: &'static str, cpu: &'static str, endian: Endianness) -> CpuTriple {
    CpuTriple {
        cpu_family,
        cpu,
        endian,
    }
}

// All 32-bit ARM flavours collapse to the generic family.
const ARM: CpuTriple = triple("arm", "arm", Endianness::Little);
const AARCH64: CpuTriple = triple("aarch64", "aarch64", Endianness::Little);

/// Settings `arch` value to Meson CPU description.
pub const ARCH_TABLE: &[(&str, CpuTriple)] = &[
    ("x86", triple("x86", "x86", Endianness::Little)),
    ("x86_64", triple("x86_64", "x86_64", Endianness::Little)),
    ("ppc32be", triple("ppc", "ppc", Endianness::Big)),
    ("ppc32", triple("ppc", "ppc", Endianness::Little)),
    ("ppc64le", triple("ppc64", "ppc64", Endianness::Little)),
    ("ppc64", triple("ppc64", "ppc64", Endianness::Big)),
    ("armv4", ARM),
    ("armv4i", ARM),
    ("armv5el", ARM),
    ("armv5hf", ARM),
    ("armv6", ARM),
    ("armv7", ARM),
    ("armv7hf", ARM),
    ("armv7s", ARM),
    ("armv7k", ARM),
    ("armv8_32", ARM),
    ("armv8", AARCH64),
    ("armv8.3", AARCH64),
    ("sparc", triple("sparc", "sparc", Endianness::Big)),
    ("sparcv9", triple("sparc64", "sparc64", Endianness::Big)),
    ("mips", triple("mips", "mips", Endianness::Big)),
    ("mips64", triple("mips64", "mips64", Endianness::Big)),
    ("avr", triple("avr", "avr", Endianness::Little)),
    ("s390", triple("s390", "s390", Endianness::Big)),
    ("s390x", triple("s390", "s390", Endianness::Big)),
    ("wasm", triple("wasm", "wasm", Endianness::Little)),
];

/// Resolve a settings architecture to its Meson CPU description.
pub fn resolve_arch(arch: &str) -> Result<CpuTriple, MesonError> {
    ARCH_TABLE
        .iter()
        .find(|(id, _)| *id == arch)
        .map(|(_, triple)| *triple)
        .ok_or_else(|| MesonError::UnknownArchitecture(arch.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // `arch` values of the default settings model that Meson builds accept.
    // Maintained apart from ARCH_TABLE: a value added here without a table
    // entry, or a table entry with no settings value, fails below.
    const SETTINGS_ARCHITECTURES: &[&str] = &[
        "x86", "x86_64", "ppc32be", "ppc32", "ppc64le", "ppc64", "armv4", "armv4i",
        "armv5el", "armv5hf", "armv6", "armv7", "armv7hf", "armv7s", "armv7k", "armv8_32",
        "armv8", "armv8.3", "sparc", "sparcv9", "mips", "mips64", "avr", "s390", "s390x",
        "wasm",
    ];

    #[test]
    fn test_every_settings_arch_resolves() {
        for arch in SETTINGS_ARCHITECTURES {
            let triple = resolve_arch(arch)
                .unwrap_or_else(|_| panic!("no table entry for `{}`", arch));
            assert!(matches!(triple.endian.as_str(), "little" | "big"));
        }
    }

    #[test]
    fn test_table_has_no_unknown_or_duplicate_entries() {
        let mut seen = std::collections::HashSet::new();
        for (id, _) in ARCH_TABLE {
            assert!(
                SETTINGS_ARCHITECTURES.contains(id),
                "`{}` is not a settings architecture",
                id
            );
            assert!(seen.insert(*id), "duplicate table entry `{}`", id);
        }
        assert_eq!(seen.len(), SETTINGS_ARCHITECTURES.len());
    }

    #[test]
    fn test_arm64_variants_are_aarch64() {
        for arch in ["armv8", "armv8.3"] {
            let triple = resolve_arch(arch).unwrap();
            assert_eq!(triple.cpu, "aarch64");
            assert_eq!(triple.cpu_family, "aarch64");
        }
    }

    #[test]
    fn test_arm32_collapses_to_generic() {
        for arch in ["armv4", "armv6", "armv7hf", "armv8_32"] {
            assert_eq!(resolve_arch(arch).unwrap(), ARM);
        }
    }

    #[test]
    fn test_big_endian_entries() {
        assert_eq!(resolve_arch("ppc64").unwrap().endian, Endianness::Big);
        assert_eq!(resolve_arch("ppc64le").unwrap().endian, Endianness::Little);
        assert_eq!(resolve_arch("s390x").unwrap().cpu_family, "s390");
        assert_eq!(resolve_arch("sparcv9").unwrap().cpu, "sparc64");
    }

    #[test]
    fn test_unknown_arch() {
        let err = resolve_arch("riscv128").unwrap_err();
        assert!(matches!(err, MesonError::UnknownArchitecture(ref a) if a == "riscv128"));
    }
}
