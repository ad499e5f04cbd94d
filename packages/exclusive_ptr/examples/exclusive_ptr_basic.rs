//! Walks through the lifecycle of `ExclusivePtr`: creation, transfer, up-conversion,
//! manual release and the array and file release policies.

use std::fmt::Display;
use std::io::{Read, Write};

use exclusive_ptr::{
    DefaultDeleter, Deleter, ExclusivePtr, make, make_array_uninit, open_file, upcast,
};

fn main() {
    // A single heap object, released when its owner goes out of scope.
    let mut first = make(String::from("hello"));
    println!("first owns {:?} at {first:p}", *first);

    // Moving out of a borrowed location leaves the source null.
    let second = first.take();
    println!("after take: first is null = {}, second = {:?}", first.is_null(), *second);

    // Capture the value through a more general type without changing its lifetime.
    let general: ExclusivePtr<dyn Display> = upcast!(second => dyn Display);
    println!("as dyn Display: {}", &*general);

    // Take the handle back and release it manually.
    let mut manual = make(42_u64);
    let raw = manual.release().expect("a value was just allocated");
    // SAFETY: The handle came from make() and nothing owns it anymore.
    unsafe { DefaultDeleter::delete(raw) };
    println!("manually released; owner is null = {}", manual.is_null());

    // Arrays carry their length and are released as a whole.
    let squares = make_array_uninit::<u32>(5).init_with(|index| {
        let index = u32::try_from(index).expect("small index fits in u32");
        index.wrapping_mul(index)
    });
    println!("squares: {:?}", &*squares);

    // C stdio streams are closed rather than freed.
    let dir = tempfile::tempdir().expect("temporary directory can be created");
    let path = dir.path().join("demo.txt");

    let mut file = open_file(&path, "w").expect("file can be created");
    writeln!(file.io(), "written through an ExclusiveFile").expect("write succeeds");
    drop(file);

    let mut file = open_file(&path, "r").expect("file can be opened");
    let mut contents = String::new();
    file.io().read_to_string(&mut contents).expect("read succeeds");
    print!("file contents: {contents}");
}
