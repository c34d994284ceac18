#![allow(missing_docs)]

use std::sync::Arc;

use earray::array::{
    Atom, AtomKind, CopyOptions, EArray, EArrayBuilder, EArrayCreateError, EArrayError,
    ReadConversion, RowBuffer, RowRange,
};
use earray::container::{AccessMode, Container, ContainerError};
use earray::storage::store::MemoryStore;

fn container() -> Arc<Container<MemoryStore>> {
    Arc::new(Container::new(Arc::new(MemoryStore::new())))
}

fn readings(container: &Arc<Container<MemoryStore>>) -> EArray<MemoryStore> {
    EArrayBuilder::new(Atom::new(AtomKind::Float64, [0, 4]))
        .title("readings")
        .build(container.clone(), "/readings")
        .unwrap()
}

#[test]
fn earray_append_read() -> Result<(), Box<dyn std::error::Error>> {
    let container = container();
    let mut array = readings(&container);
    assert_eq!(array.nrows(), 0);
    assert!(array.max_buffer_rows().get() >= 1);
    assert_eq!(array.chunk_shape()[1].get(), 4);

    let elements: Vec<f64> = (0..40).map(f64::from).collect();
    array.append_elements(&[4, 4], &elements[..16])?;
    array.append_elements(&[6, 4], &elements[16..])?;
    assert_eq!(array.nrows(), 10);
    assert_eq!(array.shape(), &[10, 4]);
    assert_eq!(array.retrieve_elements::<f64>(0..10)?, elements);
    assert_eq!(array.retrieve_elements::<f64>(3..5)?, elements[12..20]);

    let every_third = array.row_range(None, None, Some(3))?;
    assert_eq!(every_third.num_rows(), 4);
    assert_eq!(
        array.retrieve_elements::<f64>(every_third)?,
        [&elements[0..4], &elements[12..16], &elements[24..28], &elements[36..40]].concat()
    );

    // appending zero rows is a no-op
    array.append_elements::<f64>(&[0, 4], &[])?;
    assert_eq!(array.nrows(), 10);
    Ok(())
}

#[test]
fn earray_append_shape_mismatch() {
    let container = container();
    let mut array = readings(&container);
    array.append_elements(&[1, 4], &[0.0f64; 4]).unwrap();

    let result = array.append_elements(&[4], &[0.0f64; 4]);
    assert!(matches!(
        result,
        Err(EArrayError::RankMismatch {
            buffer_rank: 1,
            array_rank: 2,
            ..
        })
    ));
    let message = result.unwrap_err().to_string();
    assert!(message.contains("/readings"));

    assert!(matches!(
        array.append_elements(&[1, 3], &[0.0f64; 3]),
        Err(EArrayError::DimensionMismatch {
            axis: 1,
            expected: 4,
            actual: 3,
            ..
        })
    ));
    assert_eq!(array.nrows(), 1);
}

#[test]
fn earray_truncate() -> Result<(), Box<dyn std::error::Error>> {
    let container = container();
    let mut array = EArrayBuilder::new(Atom::new(AtomKind::Int32, [0]))
        .expected_rows(10)
        .build(container, "/counts")?;
    let elements: Vec<i32> = (0..1000).collect();
    array.append_elements(&[1000], &elements)?;

    assert!(matches!(
        array.truncate(0),
        Err(EArrayError::InvalidTruncateSize)
    ));
    array.truncate(123)?;
    assert_eq!(array.nrows(), 123);
    assert_eq!(array.shape(), &[123]);
    assert_eq!(array.retrieve_elements::<i32>(0..123)?, elements[..123]);
    assert!(array.retrieve_rows(0..124).is_err());

    array.append_elements(&[2], &[-1, -2])?;
    assert_eq!(array.retrieve_elements::<i32>(122..125)?, vec![122, -1, -2]);
    Ok(())
}

#[test]
fn earray_copy() -> Result<(), Box<dyn std::error::Error>> {
    let container = container();
    let mut source = readings(&container);
    let elements: Vec<f64> = (0..40).map(f64::from).collect();
    source.append_elements(&[10, 4], &elements)?;

    let destination = Arc::new(Container::new(Arc::new(MemoryStore::new())));
    let (copy, nbytes) = source.copy(destination.clone(), "/copy", &CopyOptions::new())?;
    assert_eq!(nbytes, 320);
    assert_eq!(copy.nrows(), 10);
    assert_eq!(copy.title(), "readings");
    assert_eq!(copy.expected_rows(), 10);
    assert_eq!(copy.atom(), source.atom());
    assert_eq!(copy.retrieve_elements::<f64>(0..10)?, elements);

    let (single, _) = source.copy(
        destination.clone(),
        "/single",
        &CopyOptions::new().with_start(-2),
    )?;
    assert_eq!(single.retrieve_elements::<f64>(0..1)?, elements[32..36]);

    assert!(matches!(
        source.copy(
            destination.clone(),
            "/out_of_range",
            &CopyOptions::new().with_start(10)
        ),
        Err(EArrayError::RowRangeError(_))
    ));
    assert!(matches!(
        source.copy(destination, "/copy", &CopyOptions::new()),
        Err(EArrayError::CreateError(EArrayCreateError::NodeExists(_)))
    ));
    Ok(())
}

#[test]
fn earray_copy_windows() -> Result<(), Box<dyn std::error::Error>> {
    let container = container();
    let mut source = EArrayBuilder::new(Atom::new(AtomKind::UInt16, [3, 0]))
        .expected_rows(1)
        .build(container.clone(), "/wide")?;
    let max_buffer_rows = source.max_buffer_rows().get();
    let rows = max_buffer_rows * 3 + 1;
    let elements: Vec<u16> = (0..rows * 3).map(|i| (i % 65_536) as u16).collect();
    source.append_elements(&[3, rows], &elements)?;

    let (copy, _) = source.copy(
        container,
        "/wide_copy",
        &CopyOptions::new().with_start(1).with_stop(-1).with_step(2),
    )?;
    let range = RowRange::normalize(rows, Some(1), Some(-1), Some(2))?;
    assert_eq!(copy.nrows(), range.num_rows());
    assert_eq!(copy.extdim(), 1);
    assert_eq!(
        copy.read_all()?,
        source.retrieve_rows(range)?
    );
    Ok(())
}

#[test]
fn earray_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let container = container();
    let mut array = readings(&container);
    array.append_elements(&[5, 4], &[1.5f64; 20])?;
    let chunk_shape = array.chunk_shape().to_vec();
    drop(array);

    let array = EArray::open(container.clone(), "/readings")?;
    assert_eq!(array.nrows(), 5);
    assert_eq!(array.expected_rows(), 5);
    assert_eq!(array.shape(), &[5, 4]);
    assert_eq!(array.atom(), &Atom::new(AtomKind::Float64, [0, 4]));
    assert_eq!(array.chunk_shape(), chunk_shape);
    assert_eq!(array.title(), "readings");
    assert_eq!(array.retrieve_elements::<f64>(0..5)?, vec![1.5; 20]);

    assert!(matches!(
        EArray::open(container, "/missing"),
        Err(EArrayCreateError::MissingMetadata(_))
    ));
    Ok(())
}

#[test]
fn earray_read_only_container() -> Result<(), Box<dyn std::error::Error>> {
    let container = container();
    let mut array = readings(&container);
    array.append_elements(&[1, 4], &[0.0f64; 4])?;

    container.set_access_mode(AccessMode::ReadOnly);
    assert!(matches!(
        EArrayBuilder::new(Atom::new(AtomKind::Float64, [0]))
            .build(container.clone(), "/other"),
        Err(EArrayCreateError::ContainerError(ContainerError::ReadOnly))
    ));
    assert!(matches!(
        array.append_elements(&[1, 4], &[0.0f64; 4]),
        Err(EArrayError::ContainerError(ContainerError::ReadOnly))
    ));
    assert!(matches!(
        array.truncate(1),
        Err(EArrayError::ContainerError(ContainerError::ReadOnly))
    ));
    assert_eq!(array.nrows(), 1);
    assert!(array.read_all().is_ok());

    container.set_access_mode(AccessMode::ReadWrite);
    array.append_elements(&[1, 4], &[0.0f64; 4])?;
    assert_eq!(array.nrows(), 2);
    Ok(())
}

#[test]
fn earray_raw_and_native_reads() -> Result<(), Box<dyn std::error::Error>> {
    let container = container();
    let mut array = EArrayBuilder::new(Atom::new(AtomKind::UInt32, [0]))
        .build(container, "/values")?;
    array.append(&RowBuffer::new_native([2], u32::to_ne_bytes(7).repeat(2)))?;

    let raw = array.retrieve_rows_opt(0..2, ReadConversion::Raw)?;
    assert_eq!(raw.bytes(), 7u32.to_le_bytes().repeat(2));
    let native = array.retrieve_rows(0..2)?;
    assert_eq!(native.bytes(), 7u32.to_ne_bytes().repeat(2));
    Ok(())
}

#[test]
fn earray_enum_type() -> Result<(), Box<dyn std::error::Error>> {
    use earray::array::{EnumType, IntegerKind};

    let colors = EnumType::new(IntegerKind::UInt8, [("red", 0), ("green", 1), ("blue", 2)])?;
    let container = container();
    let mut array = EArrayBuilder::new(Atom::new(AtomKind::Enum(colors.clone()), [0]))
        .build(container, "/colors")?;
    assert_eq!(array.enum_type()?, &colors);

    array.append_elements(&[3], &[2u8, 0, 1])?;
    assert!(array.append_elements(&[1], &[3u8]).is_err());
    let names: Vec<&str> = array
        .retrieve_elements::<u8>(0..3)?
        .into_iter()
        .filter_map(|value| colors.name(i64::from(value)))
        .collect();
    assert_eq!(names, vec!["blue", "red", "green"]);
    Ok(())
}

#[test]
fn container_array_paths() -> Result<(), Box<dyn std::error::Error>> {
    let container = container();
    for path in ["/b", "/a/x", "/a"] {
        EArrayBuilder::new(Atom::new(AtomKind::Int8, [0])).build(container.clone(), path)?;
    }
    let paths: Vec<String> = container
        .array_paths()?
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(paths, vec!["/a", "/a/x", "/b"]);
    Ok(())
}

#[cfg(feature = "ndarray")]
#[test]
fn earray_ndarray() -> Result<(), Box<dyn std::error::Error>> {
    let container = container();
    let mut array = EArrayBuilder::new(Atom::new(AtomKind::Int64, [2, 0, 3]))
        .build(container, "/cube")?;
    let block = ndarray::Array3::<i64>::from_shape_fn((2, 4, 3), |(i, j, k)| {
        (i * 100 + j * 10 + k) as i64
    });
    array.append_ndarray(&block)?;
    array.append_ndarray(&block.slice(ndarray::s![.., 0..1, ..]))?;
    assert_eq!(array.shape(), &[2, 5, 3]);

    let read = array.retrieve_ndarray::<i64>(1..5)?;
    assert_eq!(read.shape(), &[2, 4, 3]);
    assert_eq!(read[[1, 0, 2]], 112);
    assert_eq!(read[[0, 3, 0]], 0);
    Ok(())
}
