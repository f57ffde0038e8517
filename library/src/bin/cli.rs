use operator_graph::LibraryError;
use operator_graph::run;

fn main() -> Result<(), LibraryError> {
    run(std::env::args().collect())
}
