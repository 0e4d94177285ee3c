use rampart::uci;

fn main() {
    uci::run();
}
