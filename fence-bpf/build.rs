//! Build script for fence-bpf
//!
//! Generates the libbpf skeleton for `src/bpf/fence.bpf.c` when the `bpf`
//! feature is enabled. Without the feature nothing is compiled, which keeps
//! unit tests runnable on machines without clang or kernel headers.

fn main() {
    println!("cargo:rerun-if-changed=src/bpf/fence.bpf.c");
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "bpf")]
    skeleton::generate();
}

#[cfg(feature = "bpf")]
mod skeleton {
    use std::env;
    use std::path::PathBuf;

    use libbpf_cargo::SkeletonBuilder;

    const SRC: &str = "src/bpf/fence.bpf.c";

    pub fn generate() {
        let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
        let arch = env::var("CARGO_CFG_TARGET_ARCH").expect("target arch is set by cargo");
        let arch = match arch.as_str() {
            "x86_64" => "x86",
            "aarch64" => "arm64",
            other => panic!("unsupported BPF target architecture: {}", other),
        };

        if !PathBuf::from("src/bpf/vmlinux.h").exists() {
            panic!(
                "src/bpf/vmlinux.h is missing; generate it with \
                 `bpftool btf dump file /sys/kernel/btf/vmlinux format c > src/bpf/vmlinux.h`"
            );
        }

        SkeletonBuilder::new()
            .source(SRC)
            .clang_args(["-Isrc/bpf".to_string(), format!("-D__TARGET_ARCH_{}", arch)])
            .build_and_generate(out_dir.join("fence.skel.rs"))
            .expect("failed to build BPF skeleton");
    }
}
