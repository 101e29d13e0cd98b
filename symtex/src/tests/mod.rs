// Store tests
mod graph;


// Parser tests
mod parsing;
mod rendering;

// Comparer tests
mod matching;

// Calculator tests
mod arithmetic;

// Resolution tests
mod resolution;

// Session tests
mod session_flow;
