//! Kernel command line composition for PXE profiles.

use serde::{Deserialize, Serialize};

/// Hardening and platform arguments placed between `initrd=` and caller
/// arguments. Order is part of the generated profile format.
pub const FIXED_KERNEL_ARGS: [&str; 6] = [
    "init_on_alloc=1",
    "slab_nomerge",
    "pti=on",
    "console=tty0",
    "printk.devkmsg=on",
    "talos.platform=metal",
];

/// Ordered kernel arguments; `initrd=<file>` is always first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KernelArgList(Vec<String>);

impl KernelArgList {
    /// `initrd=<initrd_file_name>`, then `fixed`, then `caller` verbatim.
    ///
    /// No deduplication or syntax checks: conflicting arguments pass through.
    pub fn build<S: AsRef<str>>(initrd_file_name: &str, fixed: &[&str], caller: &[S]) -> Self {
        let mut args = Vec::with_capacity(1 + fixed.len() + caller.len());
        args.push(format!("initrd={}", initrd_file_name));
        args.extend(fixed.iter().map(|arg| (*arg).to_string()));
        args.extend(caller.iter().map(|arg| arg.as_ref().to_string()));
        Self(args)
    }

    /// Build with [`FIXED_KERNEL_ARGS`]
    pub fn for_pxe<S: AsRef<str>>(initrd_file_name: &str, caller: &[S]) -> Self {
        Self::build(initrd_file_name, &FIXED_KERNEL_ARGS, caller)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}
