use std::io::Cursor;
use std::sync::Arc;
use std::thread;

use dumpview_testkit::ImageBuilder;

use crate::image::{ImageError, MemoryImage, MemoryReader, StreamExtent, StreamImage, decode_pointer};

#[test]
fn reads_within_one_region() {
	let image = MemoryImage::from_regions(8, ImageBuilder::new(8).region(0x1000, 16).u32(0x1004, 0xdead_beef).build()).expect("image builds");

	assert_eq!(image.read(0x1004, 4).expect("read succeeds"), 0xdead_beef_u32.to_le_bytes());
	assert_eq!(image.total_bytes(), 16);
}

#[test]
fn reads_span_adjacent_regions() {
	let image = MemoryImage::from_regions(8, vec![(0x1000, vec![1, 2]), (0x1002, vec![3, 4])]).expect("image builds");
	assert_eq!(image.read(0x1001, 3).expect("spanning read succeeds"), vec![2, 3, 4]);
}

#[test]
fn gap_between_regions_is_out_of_range() {
	let image = MemoryImage::from_regions(8, vec![(0x1000, vec![1, 2]), (0x1003, vec![3, 4])]).expect("image builds");
	let err = image.read(0x1001, 3).expect_err("gap must fail");
	assert!(matches!(err, ImageError::OutOfRange { address: 0x1001, len: 3 }));
}

#[test]
fn unmapped_and_wrapping_reads_fail() {
	let image = MemoryImage::from_regions(8, vec![(0x1000, vec![0; 8])]).expect("image builds");

	assert!(matches!(image.read(0x0fff, 1), Err(ImageError::OutOfRange { .. })));
	assert!(matches!(image.read(0x1008, 1), Err(ImageError::OutOfRange { .. })));
	assert!(matches!(image.read(u64::MAX, 2), Err(ImageError::OutOfRange { .. })));
	assert!(!image.contains(0x1004, 8));
	assert!(image.contains(0x1000, 8));
}

#[test]
fn overlapping_regions_are_rejected() {
	let err = MemoryImage::from_regions(8, vec![(0x1000, vec![0; 8]), (0x1004, vec![0; 8])]).expect_err("overlap must fail");
	assert!(matches!(err, ImageError::RegionOverlap { base: 0x1004 }));
}

#[test]
fn pointer_reads_follow_image_width() {
	let narrow = MemoryImage::from_regions(4, ImageBuilder::new(4).region(0x100, 8).ptr(0x100, 0x4242_4242).u32(0x104, 0xffff_ffff).build())
		.expect("32-bit image builds");
	assert_eq!(narrow.read_pointer(0x100).expect("pointer read"), 0x4242_4242);

	let wide = MemoryImage::from_regions(8, ImageBuilder::new(8).region(0x100, 8).ptr(0x100, 0x1_0000_0001).build()).expect("64-bit image builds");
	assert_eq!(wide.read_pointer(0x100).expect("pointer read"), 0x1_0000_0001);
}

#[test]
fn rejects_unsupported_pointer_width() {
	assert!(matches!(MemoryImage::from_regions(2, Vec::new()), Err(ImageError::UnsupportedPointerSize { size: 2 })));
	assert!(matches!(decode_pointer(&[0; 8], 6), Err(ImageError::UnsupportedPointerSize { size: 6 })));
}

#[test]
fn stream_image_maps_extents_to_file_offsets() {
	let mut file = vec![0_u8; 32];
	file[16..20].copy_from_slice(&0x4242_4242_u32.to_le_bytes());
	let image = StreamImage::new(
		Cursor::new(file),
		4,
		vec![StreamExtent {
			base: 0x8000,
			len: 16,
			file_offset: 16,
		}],
	)
	.expect("stream image builds");

	assert_eq!(image.read_pointer(0x8000).expect("pointer read"), 0x4242_4242);
	assert!(matches!(image.read(0x8010, 1), Err(ImageError::OutOfRange { .. })));
}

#[test]
fn stream_image_serializes_concurrent_reads() {
	let mut file = Vec::new();
	for value in 0_u32..256 {
		file.extend_from_slice(&value.to_le_bytes());
	}
	let image = Arc::new(
		StreamImage::new(
			Cursor::new(file),
			8,
			vec![StreamExtent {
				base: 0x10_0000,
				len: 1024,
				file_offset: 0,
			}],
		)
		.expect("stream image builds"),
	);

	let workers: Vec<_> = (0..4)
		.map(|worker| {
			let image = Arc::clone(&image);
			thread::spawn(move || {
				for round in 0..200_u64 {
					let slot = (worker * 61 + round * 7) % 256;
					let raw = image.read(0x10_0000 + slot * 4, 4).expect("read succeeds");
					assert_eq!(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as u64, slot);
				}
			})
		})
		.collect();

	for worker in workers {
		worker.join().expect("worker finishes");
	}
}
