//! Constant folding.
//!
//! Constants are evaluated on demand so a constant may refer to one
//! declared later; a constant that depends on itself is an initialization
//! cycle. Array lengths are folded afterwards, once every constant of the
//! package has a value.

use minigo_common::{ConstId, Diagnostic, Entity, GtypeId, SymbolInterner};
use minigo_syntax::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use tracing::trace;

use crate::errors::TypeError;
use crate::program::{Builtin, ConstKind, ConstValue, Program};
use crate::types::GtypeKind;

/// A folded value and, for typed constant expressions, its type.
#[derive(Debug, Clone)]
struct Folded {
    value: ConstValue,
    ty: Option<GtypeId>,
}

impl Folded {
    fn untyped(value: ConstValue) -> Self {
        Self { value, ty: None }
    }
}

struct Evaluator<'a> {
    program: &'a mut Program,
    interner: &'a SymbolInterner,
    visiting: Vec<ConstId>,
}

/// Evaluates the constants of a package, then its pending array lengths.
pub(crate) fn evaluate_package(
    program: &mut Program,
    interner: &SymbolInterner,
    consts: &[ConstId],
) -> Result<(), Diagnostic> {
    let mut eval = Evaluator {
        program,
        interner,
        visiting: Vec::new(),
    };
    for &c in consts {
        eval.constant(c)?;
    }

    let lens = std::mem::take(&mut eval.program.pending_array_lens);
    for (array, expr) in &lens {
        let folded = eval.expr(expr, 0)?;
        let n = match folded.value {
            ConstValue::Int(n) if n >= 0 => n,
            _ => return Err(TypeError::InvalidArrayLength.at(expr.span)),
        };
        if let GtypeKind::Array { len, .. } = &mut eval.program.gtypes[*array].kind {
            *len = Some(n);
        }
    }
    Ok(())
}

impl Evaluator<'_> {
    fn constant(&mut self, id: ConstId) -> Result<Folded, Diagnostic> {
        let c = &self.program.consts[id];
        let typed = c.explicit_type;
        if let Some(value) = &c.value {
            return Ok(Folded {
                value: value.clone(),
                ty: if typed || c.kind != ConstKind::User { c.ty } else { None },
            });
        }
        if matches!(c.kind, ConstKind::Nil | ConstKind::Iota) {
            return Err(TypeError::NotConstant.at(c.span));
        }
        if self.visiting.contains(&id) {
            let name = self.interner.name(c.name);
            return Err(TypeError::InitializationCycle.named_at(c.span, name));
        }
        let Some(expr) = c.expr.clone() else {
            return Err(TypeError::NotConstant.at(c.span));
        };
        let iota = c.iota;
        let declared = c.ty;

        self.visiting.push(id);
        let folded = self.expr(&expr, iota)?;
        self.visiting.pop();

        let ty = match declared {
            Some(t) => {
                self.check_representable(&folded.value, t, expr.span)?;
                Some(t)
            }
            None => folded.ty,
        };
        let default = match folded.value {
            ConstValue::Int(_) => self.program.types.int,
            ConstValue::Bool(_) => self.program.types.bool,
            ConstValue::Str { .. } => self.program.types.string,
        };
        let value = match ty {
            Some(t) if matches!(self.program.kind(t), GtypeKind::Byte) => match folded.value {
                ConstValue::Int(n) => ConstValue::Int(n & 0xff),
                other => other,
            },
            _ => folded.value,
        };
        trace!(name = self.interner.name(self.program.consts[id].name), ?value, "constant");

        let c = &mut self.program.consts[id];
        c.value = Some(value.clone());
        c.explicit_type = ty.is_some();
        c.ty = Some(ty.unwrap_or(default));
        Ok(Folded { value, ty })
    }

    fn check_representable(
        &self,
        value: &ConstValue,
        ty: GtypeId,
        span: minigo_common::Span,
    ) -> Result<(), Diagnostic> {
        let ok = match (value, self.program.kind(ty)) {
            (ConstValue::Int(_), GtypeKind::Int | GtypeKind::Byte) => true,
            (ConstValue::Bool(_), GtypeKind::Bool) => true,
            (ConstValue::Str { .. }, GtypeKind::String) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            let name = self.program.type_name(ty, self.interner);
            Err(TypeError::MismatchedTypes
                .at_with_message(span, format!("cannot use constant as {} value", name)))
        }
    }

    fn expr(&mut self, expr: &Expr, iota: i64) -> Result<Folded, Diagnostic> {
        let not_constant = || TypeError::NotConstant.at(expr.span);
        match &expr.kind {
            ExprKind::IntLit(n) => Ok(Folded::untyped(ConstValue::Int(*n))),
            ExprKind::CharLit(c) => Ok(Folded::untyped(ConstValue::Int(*c as i64))),
            ExprKind::StringLit(s) => Ok(Folded::untyped(ConstValue::Str {
                text: s.text.clone(),
                len: s.len,
            })),
            ExprKind::Ident(rel) => match rel.entity() {
                Some(Entity::Const(c)) if c == self.program.iota => {
                    Ok(Folded::untyped(ConstValue::Int(iota)))
                }
                Some(Entity::Const(c)) => self.constant(c),
                _ => Err(not_constant()),
            },
            ExprKind::Unary(op, operand) => {
                let inner = self.expr(operand, iota)?;
                let value = match (op, inner.value) {
                    (UnaryOp::Neg, ConstValue::Int(n)) => ConstValue::Int(n.wrapping_neg()),
                    (UnaryOp::Not, ConstValue::Bool(b)) => ConstValue::Bool(!b),
                    _ => return Err(TypeError::InvalidOperation.at(expr.span)),
                };
                Ok(Folded {
                    value,
                    ty: inner.ty,
                })
            }
            ExprKind::Binary(b) => {
                let left = self.expr(&b.left, iota)?;
                let right = self.expr(&b.right, iota)?;
                let value = binary(b.op, left.value, right.value)
                    .map_err(|e| e.at(expr.span))?;
                let ty = if b.op.is_comparison() {
                    None
                } else {
                    left.ty.or(right.ty)
                };
                Ok(Folded { value, ty })
            }
            ExprKind::Call(call) => {
                let Some(rel) = call.func.as_relation() else {
                    return Err(not_constant());
                };
                match (rel.entity(), call.args.as_slice()) {
                    (Some(Entity::Type(t)), [arg]) => self.convert(t, arg, iota),
                    (Some(Entity::Func(f)), [arg])
                        if self.program.funcs[f].builtin() == Some(Builtin::Len) =>
                    {
                        match self.expr(arg, iota)?.value {
                            ConstValue::Str { len, .. } => {
                                Ok(Folded::untyped(ConstValue::Int(len as i64)))
                            }
                            _ => Err(not_constant()),
                        }
                    }
                    _ => Err(not_constant()),
                }
            }
            ExprKind::Conversion(ty, arg) => match ty.gtype {
                Some(t) => self.convert(t, arg, iota),
                None => Err(not_constant()),
            },
            _ => Err(not_constant()),
        }
    }

    fn convert(&mut self, ty: GtypeId, arg: &Expr, iota: i64) -> Result<Folded, Diagnostic> {
        let inner = self.expr(arg, iota)?;
        self.check_representable(&inner.value, ty, arg.span)?;
        Ok(Folded {
            value: inner.value,
            ty: Some(ty),
        })
    }
}

fn binary(op: BinaryOp, left: ConstValue, right: ConstValue) -> Result<ConstValue, TypeError> {
    use ConstValue::*;
    let value = match (left, right) {
        (Int(a), Int(b)) => match op {
            BinaryOp::Add => Int(a.wrapping_add(b)),
            BinaryOp::Sub => Int(a.wrapping_sub(b)),
            BinaryOp::Mul => Int(a.wrapping_mul(b)),
            BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(TypeError::DivisionByZero),
            BinaryOp::Div => Int(a.wrapping_div(b)),
            BinaryOp::Rem => Int(a.wrapping_rem(b)),
            BinaryOp::Eq => Bool(a == b),
            BinaryOp::Ne => Bool(a != b),
            BinaryOp::Lt => Bool(a < b),
            BinaryOp::Le => Bool(a <= b),
            BinaryOp::Gt => Bool(a > b),
            BinaryOp::Ge => Bool(a >= b),
            BinaryOp::AndAnd | BinaryOp::OrOr => return Err(TypeError::InvalidOperation),
        },
        (Bool(a), Bool(b)) => match op {
            BinaryOp::AndAnd => Bool(a && b),
            BinaryOp::OrOr => Bool(a || b),
            BinaryOp::Eq => Bool(a == b),
            BinaryOp::Ne => Bool(a != b),
            _ => return Err(TypeError::InvalidOperation),
        },
        (Str { text: a, len: la }, Str { text: b, len: lb }) => match op {
            BinaryOp::Add => Str {
                text: a + &b,
                len: la + lb,
            },
            BinaryOp::Eq => Bool(a == b),
            BinaryOp::Ne => Bool(a != b),
            _ => return Err(TypeError::InvalidOperation),
        },
        _ => return Err(TypeError::MismatchedTypes),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use minigo_common::CompilationContext;
    use minigo_syntax::parse_source;

    use super::*;
    use crate::analyze_package;

    fn consts_of(src: &str) -> Result<Vec<(String, ConstValue, String)>, u16> {
        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);
        let file = parse_source(&mut ctx, "a.go", src).unwrap();
        let name = ctx.interner.intern("main");
        let index = analyze_package(&mut program, &ctx.interner, name, "main", vec![file])
            .map_err(|sink| sink.iter().next().and_then(|d| d.code).unwrap_or(0))?;
        Ok(program.packages[index]
            .consts
            .iter()
            .map(|&c| {
                let k = &program.consts[c];
                (
                    ctx.interner.name(k.name).to_owned(),
                    k.value.clone().unwrap(),
                    program.type_name(k.ty.unwrap(), &ctx.interner),
                )
            })
            .collect())
    }

    #[test]
    fn test_iota_group() {
        let consts = consts_of(
            "package main\n\
             const (\n  A = iota\n  B\n  C = iota * 10\n  D\n)\n\
             func main() {}\n",
        )
        .unwrap();
        let values: Vec<_> = consts.iter().map(|(_, v, _)| v.as_int().unwrap()).collect();
        assert_eq!(values, vec![0, 1, 20, 30]);
    }

    #[test]
    fn test_forward_and_typed_constants() {
        let consts = consts_of(
            "package main\n\
             const Size = Half * 2\n\
             const Half byte = 4\n\
             const Name = \"ab\" + \"c\"\n\
             const Big = len(Name) > 2\n\
             func main() {}\n",
        )
        .unwrap();
        assert_eq!(consts[0], ("Size".to_owned(), ConstValue::Int(8), "byte".to_owned()));
        assert_eq!(
            consts[2].1,
            ConstValue::Str {
                text: "abc".to_owned(),
                len: 3
            }
        );
        assert_eq!(consts[3].1, ConstValue::Bool(true));
        assert_eq!(consts[3].2, "bool");
    }

    #[test]
    fn test_array_length_from_constant() {
        let mut ctx = CompilationContext::new();
        let mut program = Program::new(&mut ctx.interner);
        let src = "package main\nvar buf [N + 1]byte\nconst N = 3\nfunc main() {}\n";
        let file = parse_source(&mut ctx, "a.go", src).unwrap();
        let name = ctx.interner.intern("main");
        let index = analyze_package(&mut program, &ctx.interner, name, "main", vec![file]).unwrap();
        let buf = program.packages[index].globals[0];
        let ty = program.vars[buf].gtype().unwrap();
        assert_eq!(program.type_name(ty, &ctx.interner), "[4]byte");
        assert_eq!(program.size(ty), 4);
    }

    #[test]
    fn test_constant_errors() {
        assert_eq!(
            consts_of("package main\nconst A = B\nconst B = A\nfunc main() {}\n"),
            Err(TypeError::InitializationCycle.code())
        );
        assert_eq!(
            consts_of("package main\nconst A = 1 / 0\nfunc main() {}\n"),
            Err(TypeError::DivisionByZero.code())
        );
        assert_eq!(
            consts_of("package main\nconst S string = 1\nfunc main() {}\n"),
            Err(TypeError::MismatchedTypes.code())
        );
    }
}
