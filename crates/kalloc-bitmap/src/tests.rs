use super::*;

fn store<const N: usize>() -> [BitmapWord; N] {
  [const { BitmapWord::new(0) }; N]
}

#[test]
fn set_clear_get_across_words() {
  let storage = store::<2>();
  let bits = storage.len() * usize::BITS as usize;
  let bitmap = Bitmap::zero(&storage, bits).unwrap();

  bitmap.set(0).unwrap();
  bitmap.set(63).unwrap();
  bitmap.set(64).unwrap();
  bitmap.set(99).unwrap();

  assert!(bitmap.get(0).unwrap());
  assert!(bitmap.get(63).unwrap());
  assert!(bitmap.get(64).unwrap());
  assert!(bitmap.get(99).unwrap());
  assert!(!bitmap.get(32).unwrap());

  bitmap.clear(64).unwrap();
  assert!(!bitmap.get(64).unwrap());
}

#[test]
fn used_counts_distinct_bits() {
  let storage = store::<1>();
  let bitmap = Bitmap::zero(&storage, 16).unwrap();

  bitmap.set(3).unwrap();
  bitmap.set(3).unwrap();
  bitmap.set(7).unwrap();
  assert_eq!(bitmap.used(), 2);

  bitmap.clear(3).unwrap();
  bitmap.clear(3).unwrap();
  assert_eq!(bitmap.used(), 1);

  bitmap.clear_all();
  assert_eq!(bitmap.used(), 0);
}

#[test]
fn find_clear_from_scans_forward_only() {
  let storage = store::<1>();
  let bitmap = Bitmap::zero(&storage, 8).unwrap();

  assert_eq!(bitmap.find_clear_from(0), Some(0));
  assert_eq!(bitmap.find_clear_from(5), Some(5));

  for index in 0..4 {
    bitmap.set(index).unwrap();
  }
  assert_eq!(bitmap.find_clear_from(0), Some(4));
  assert_eq!(bitmap.find_clear_from(2), Some(4));

  // a clear bit behind the start index stays invisible
  bitmap.clear(1).unwrap();
  assert_eq!(bitmap.find_clear_from(2), Some(4));
  assert_eq!(bitmap.find_clear_from(0), Some(1));
}

#[test]
fn find_clear_from_crosses_word_boundary() {
  let storage = store::<2>();
  let bits = storage.len() * usize::BITS as usize;
  let bitmap = Bitmap::zero(&storage, bits).unwrap();

  for index in 0..usize::BITS as usize {
    bitmap.set(index).unwrap();
  }
  assert_eq!(bitmap.find_clear_from(0), Some(usize::BITS as usize));
}

#[test]
fn find_clear_from_full_map() {
  let storage = store::<1>();
  let bitmap = Bitmap::zero(&storage, 4).unwrap();

  for index in 0..4 {
    bitmap.set(index).unwrap();
  }
  assert_eq!(bitmap.find_clear_from(0), None);
  assert_eq!(bitmap.find_clear_from(4), None);
  assert_eq!(bitmap.find_clear_from(100), None);
}

#[test]
fn error_handling() {
  let storage = store::<1>();
  let bits = usize::BITS as usize;

  assert!(matches!(
    Bitmap::zero(&storage, bits + 1),
    Err(BitmapError::InsufficientSize { .. })
  ));

  let bitmap = Bitmap::zero(&storage, 8).unwrap();
  assert!(matches!(
    bitmap.set(8),
    Err(BitmapError::OutOfBounds { index: 8, size: 8 })
  ));
  assert!(matches!(bitmap.get(100), Err(BitmapError::OutOfBounds { .. })));
}

#[test]
fn sizing_helpers() {
  let word_bits = usize::BITS as usize;
  assert_eq!(Bitmap::words(0), 0);
  assert_eq!(Bitmap::words(1), 1);
  assert_eq!(Bitmap::words(word_bits), 1);
  assert_eq!(Bitmap::words(word_bits + 1), 2);
  assert_eq!(Bitmap::bytes(word_bits), core::mem::size_of::<usize>());
}
