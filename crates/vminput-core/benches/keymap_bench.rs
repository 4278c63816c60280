//! Criterion benchmarks for the native → set-1 translation tables.
//!
//! Every key event a capture hook sees goes through one of these lookups
//! before the capture logic runs, so they sit on the hot path of the
//! single-threaded event loop.
//!
//! Run with:
//! ```bash
//! cargo bench --package vminput-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vminput_core::keymap::KeyTranslator;
use vminput_core::scancode::ScanCode;

// ── Representative native codes for benchmarking ─────────────────────────────

/// Windows VK codes covering letters, modifiers, navigation, and one
/// unmapped code.
const BENCH_VK_CODES: &[u8] = &[
    0x41, // 'A'
    0x5A, // 'Z'
    0x0D, // VK_RETURN
    0x1B, // VK_ESCAPE
    0x20, // VK_SPACE
    0x70, // VK_F1
    0x7B, // VK_F12
    0xA2, // VK_LCONTROL
    0xA3, // VK_RCONTROL
    0x90, // VK_NUMLOCK
    0x25, // VK_LEFT
    0x2E, // VK_DELETE
    0x31, // '1'
    0x30, // '0'
    0xFF, // No mapping
];

/// X11 keycodes for the same spread of keys.
const BENCH_X11_CODES: &[u8] = &[
    9,   // Escape
    38,  // A
    36,  // Return
    65,  // Space
    66,  // CapsLock
    105, // Right Ctrl
    111, // Up
    119, // Delete
    96,  // F12
    3,   // No mapping (below evdev offset)
];

// ── Benchmarks: Windows VK translation ───────────────────────────────────────

fn bench_windows_vk_to_set1(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_windows_vk");

    // Single lookup (typical per-event cost)
    group.bench_function("vk_to_set1_single", |b| {
        b.iter(|| KeyTranslator::windows_vk_to_set1(black_box(0x41)))
    });

    // Batch of diverse VK codes (simulates a burst of key events)
    group.bench_function("vk_to_set1_batch_15", |b| {
        b.iter(|| {
            BENCH_VK_CODES
                .iter()
                .map(|&vk| KeyTranslator::windows_vk_to_set1(black_box(vk)))
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

fn bench_set1_to_windows_vk(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_windows_vk");

    // set1→VK is a linear scan; benchmark best-case (early VK) and a miss.
    group.bench_with_input(
        BenchmarkId::new("set1_to_vk", "Enter"),
        &ScanCode::ENTER,
        |b, &code| b.iter(|| KeyTranslator::set1_to_windows_vk(black_box(code), false)),
    );

    group.bench_with_input(
        BenchmarkId::new("set1_to_vk", "unmapped"),
        &ScanCode(0x7F),
        |b, &code| b.iter(|| KeyTranslator::set1_to_windows_vk(black_box(code), false)),
    );

    group.finish();
}

// ── Benchmarks: X11 keycode translation ──────────────────────────────────────

fn bench_x11_keycode_to_set1(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_x11");

    group.bench_function("keycode_to_set1_single", |b| {
        b.iter(|| KeyTranslator::x11_keycode_to_set1(black_box(38)))
    });

    group.bench_function("keycode_to_set1_batch_10", |b| {
        b.iter(|| {
            BENCH_X11_CODES
                .iter()
                .map(|&kc| KeyTranslator::x11_keycode_to_set1(black_box(kc)))
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

// ── Benchmarks: macOS CGKeyCode translation ──────────────────────────────────

fn bench_macos_keycode_to_set1(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_macos");

    group.bench_function("cgkeycode_to_set1_single", |b| {
        b.iter(|| KeyTranslator::macos_keycode_to_set1(black_box(0x00)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_windows_vk_to_set1,
    bench_set1_to_windows_vk,
    bench_x11_keycode_to_set1,
    bench_macos_keycode_to_set1
);
criterion_main!(benches);
