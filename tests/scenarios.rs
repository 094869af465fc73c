//! The six concrete walkthroughs: each builds a tiny program with the
//! internal assembler and checks the VM's observable effect after one
//! `step`/`run`.

use bajo_vm::asm::{self, Assembler};
use bajo_vm::error::VmError;
use bajo_vm::memory::FlatMemory;
use bajo_vm::opcode::Opcode;
use bajo_vm::vm::{Vm, VmConfig};

fn run_to_completion(program: Vec<u8>) -> Vm<FlatMemory> {
    let mut vm = Vm::new(FlatMemory::with_program(&program), VmConfig::default());
    vm.init(0);
    vm.run();
    vm
}

#[test]
fn nop_then_exit() {
    let program = Assembler::new()
        .opcode(Opcode::Nop, false)
        .opcode(Opcode::Exit, false)
        .operand(&asm::literal_source(7, false))
        .finish();
    let vm = run_to_completion(program);
    assert_eq!(vm.last_error(), Some(VmError::Exit));
    assert_eq!(vm.exit_rc(), 7);
}

#[test]
fn add_two_constants_into_memory() {
    let program = Assembler::new()
        .opcode(Opcode::Add, false)
        .operand(&asm::direct_destination(0x100, true))
        .operand(&asm::literal_source(3, false))
        .operand(&asm::literal_source(4, false))
        .finish();
    let mut vm = Vm::new(FlatMemory::with_program(&program), VmConfig::default());
    vm.init(0);
    vm.step().unwrap();
    assert_eq!(vm.host_mut().read(0x100, 4).unwrap(), 7);
}

#[test]
fn variadic_max_of_literals() {
    let program = Assembler::new()
        .opcode(Opcode::Max, false)
        .operand(&asm::direct_destination(0x200, true))
        .count(4)
        .operand(&asm::literal_source(-1, false))
        .operand(&asm::literal_source(5, false))
        .operand(&asm::literal_source(2, false))
        .operand(&asm::literal_source(5, false))
        .finish();
    let mut vm = Vm::new(FlatMemory::with_program(&program), VmConfig::default());
    vm.init(0);
    vm.step().unwrap();
    assert_eq!(vm.host_mut().read(0x200, 4).unwrap(), 5);
}

#[test]
fn zero_division_with_flag_off_does_not_error() {
    let program = Assembler::new()
        .opcode(Opcode::Div, false)
        .operand(&asm::direct_destination(0, true))
        .operand(&asm::literal_source(10, false))
        .operand(&asm::literal_source(0, false))
        .finish();
    let mut vm = Vm::new(FlatMemory::with_program(&program), VmConfig::default());
    vm.init(0);
    assert!(vm.step().is_ok());
}

#[test]
fn zero_division_with_flag_on_errors_without_writing() {
    let program = Assembler::new()
        .opcode(Opcode::Div, false)
        .operand(&asm::direct_destination(0x300, true))
        .operand(&asm::literal_source(10, false))
        .operand(&asm::literal_source(0, false))
        .finish();
    let config = VmConfig {
        err_on_zero_division: true,
        ..Default::default()
    };
    let mut vm = Vm::new(FlatMemory::with_program(&program), config);
    vm.init(0);
    let err = vm.step().unwrap_err();
    assert_eq!(err, VmError::ZeroDivision);
    assert_eq!(vm.host_mut().read(0x300, 4).unwrap(), 0);
}

#[test]
fn branch_equal_taken_advances_pc_past_instruction_plus_offset() {
    let program = Assembler::new()
        .opcode(Opcode::BrEq, false)
        .operand(&asm::literal_source(5, false))
        .operand(&asm::literal_source(5, false))
        .operand(&asm::literal_source(4, false))
        .finish();
    let instr_len = program.len() as u32;
    let mut vm = Vm::new(FlatMemory::with_program(&program), VmConfig::default());
    vm.init(0);
    vm.step().unwrap();
    assert_eq!(vm.pc(), instr_len + 4);
}

#[test]
fn rmw_increment() {
    let program = Assembler::new()
        .opcode(Opcode::Add, true)
        .operand(&asm::direct_destination(0x300, true))
        .operand(&asm::literal_source(1, false))
        .finish();
    let mut vm = Vm::new(FlatMemory::with_program(&program), VmConfig::default());
    vm.init(0);
    vm.host_mut().write(0x300, 41, 4).unwrap();
    vm.step().unwrap();
    assert_eq!(vm.host_mut().read(0x300, 4).unwrap(), 42);
}
