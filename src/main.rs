fn main() {
    lfscan::app::startup::startup();
}
