// SPDX-FileCopyrightText: Copyright (c) 2024-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Host-level probes used by the peripheral pipeline steps: free disk space,
//! port availability and process presence. Thin OS wrappers; the exit-code
//! policy lives with the CLI.

use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::time::Duration;

use sysinfo::{Disks, System};

const PORT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct DiskReport {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub free_percent: f64,
}

/// Space report for the disk mounted at `/`, falling back to the first
/// visible disk. `None` when the host exposes no disks at all.
pub fn disk_report() -> Option<DiskReport> {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first())?;

    let total_bytes = disk.total_space();
    let available_bytes = disk.available_space();
    let free_percent = if total_bytes == 0 {
        0.0
    } else {
        available_bytes as f64 / total_bytes as f64 * 100.0
    };
    Some(DiskReport {
        total_bytes,
        available_bytes,
        free_percent,
    })
}

/// True when something already accepts connections on `127.0.0.1:port`.
pub fn port_in_use(port: u16) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpStream::connect_timeout(&addr, PORT_PROBE_TIMEOUT).is_ok()
}

/// True when a running process matches `name` by process name or command
/// line.
pub fn process_running(name: &str) -> bool {
    let mut system = System::new();
    system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
    system.processes().values().any(|process| {
        process.name().to_string_lossy().contains(name)
            || process
                .cmd()
                .iter()
                .any(|arg| arg.to_string_lossy().contains(name))
    })
}
