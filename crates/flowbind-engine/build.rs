fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_file = "proto/firmament_scheduler.proto";
    tonic_build::compile_protos(proto_file)?;
    println!("cargo:rerun-if-changed={proto_file}");
    Ok(())
}
