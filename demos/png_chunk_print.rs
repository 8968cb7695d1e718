use pngine::{
  png::{read_signature, PngChunk, RawChunkReader},
  IoSource,
};

fn main() {
  let args: Vec<String> = std::env::args().collect();
  println!("ARGS: {args:?}");
  for file_arg in args[1..].iter() {
    let path = std::path::Path::new(file_arg);
    print!("Reading `{}`... ", path.display());
    let file = match std::fs::File::open(path) {
      Ok(file) => {
        println!("opened.");
        file
      }
      Err(e) => {
        println!("{e:?}");
        continue;
      }
    };
    let mut source = IoSource::new(std::io::BufReader::new(file));
    if let Err(e) = read_signature(&mut source) {
      println!("{e}");
      continue;
    }
    for (n, raw_res) in RawChunkReader::new(source).enumerate() {
      match raw_res {
        Ok(raw) => println!("{n}: {:?}", PngChunk::try_from(&raw)),
        Err(e) => println!("{n}: {e}"),
      }
    }
  }
}
