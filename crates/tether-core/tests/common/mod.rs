//! Host classes shared by the integration tests

#![allow(dead_code)]

use std::cell::{Ref, RefMut};
use std::sync::Arc;

use tether_core::sdk::{
    ClassBuilder, DefaultValue, EventDef, EventSource, FieldDef, FromHost, HostError, HostKind,
    HostObject, HostResult, HostValue, Invocation, MethodBuilder, Operator, ParamInfo,
    PropertyDef, TypeDescriptor,
};
use tether_core::{ScriptState, TypeRegistry};

fn data<T: 'static>(obj: Option<&HostObject>) -> HostResult<Ref<'_, T>> {
    obj.ok_or_else(|| HostError::argument("instance required"))?
        .borrow::<T>()
}

fn data_mut<T: 'static>(obj: Option<&HostObject>) -> HostResult<RefMut<'_, T>> {
    obj.ok_or_else(|| HostError::argument("instance required"))?
        .borrow_mut::<T>()
}

// ============================================================================
// demo.Counter
// ============================================================================

pub struct Counter {
    pub count: i64,
}

pub fn counter_type() -> TypeDescriptor {
    ClassBuilder::new("Counter")
        .namespace("demo")
        .constructor(
            MethodBuilder::new("new")
                .optional("start", HostKind::I64, DefaultValue::Integer(0))
                .invoke(|inv| {
                    let start: i64 = inv.get(0)?;
                    Ok(inv.construct(Counter { count: start }))
                }),
        )
        .method(
            MethodBuilder::new("increment")
                .returns(HostKind::I64)
                .invoke(|inv| {
                    let mut this = inv.this_mut::<Counter>()?;
                    this.count += 1;
                    Ok(this.count.into())
                }),
        )
        .method(
            MethodBuilder::new("add")
                .param("n", HostKind::I64)
                .returns(HostKind::I64)
                .invoke(|inv| {
                    let n: i64 = inv.get(0)?;
                    let mut this = inv.this_mut::<Counter>()?;
                    this.count += n;
                    Ok(this.count.into())
                }),
        )
        .method(MethodBuilder::new("reset").invoke(|inv| {
            inv.this_mut::<Counter>()?.count = 0;
            Ok(HostValue::Nil)
        }))
        .method(MethodBuilder::new("fail").invoke(|_| Err(HostError::new("counter is jammed"))))
        .method(MethodBuilder::new("boom").invoke(|_| panic!("counter exploded")))
        .method(MethodBuilder::new("clone").invoke(|inv| {
            let count = inv.this::<Counter>()?.count;
            Ok(inv.construct(Counter { count }))
        }))
        .field(
            FieldDef::new("count", HostKind::I64, |obj| {
                Ok(data::<Counter>(obj)?.count.into())
            })
            .with_setter(|obj, value| {
                let n = i64::from_host(&value)?;
                data_mut::<Counter>(obj)?.count = n;
                Ok(())
            }),
        )
        .field(FieldDef::constant("MAX", HostKind::I64, DefaultValue::Integer(100)))
        .property(
            PropertyDef::new("doubled", HostKind::I64)
                .getter(|obj, _| Ok((data::<Counter>(obj)?.count * 2).into())),
        )
        .property(PropertyDef::new("secret", HostKind::Str).setter(|_, _, _| Ok(())))
        .display(|obj| match obj.borrow::<Counter>() {
            Ok(counter) => format!("Counter({})", counter.count),
            Err(_) => "Counter(?)".to_string(),
        })
        .build()
}

// ============================================================================
// demo.Formatter: static overloads, ref/out, variadic, generic methods
// ============================================================================

fn describe_int() -> MethodBuilder {
    MethodBuilder::new("describe")
        .as_static()
        .param("value", HostKind::I64)
        .returns(HostKind::Str)
}

fn describe_str() -> MethodBuilder {
    MethodBuilder::new("describe")
        .as_static()
        .param("value", HostKind::Str)
        .returns(HostKind::Str)
}

pub fn formatter_type(name: &str, int_first: bool) -> TypeDescriptor {
    let int = describe_int().invoke(|inv| Ok(format!("int:{}", inv.get::<i64>(0)?).into()));
    let text = describe_str().invoke(|inv| Ok(format!("str:{}", inv.get::<String>(0)?).into()));
    let builder = ClassBuilder::new(name).namespace("demo");
    let builder = if int_first {
        builder.method(int).method(text)
    } else {
        builder.method(text).method(int)
    };

    builder
        .method(
            MethodBuilder::new("try_parse")
                .as_static()
                .param("text", HostKind::Str)
                .out("value", HostKind::I64)
                .returns(HostKind::Bool)
                .invoke(|inv| {
                    let text: String = inv.get(0)?;
                    match text.trim().parse::<i64>() {
                        Ok(n) => {
                            inv.set(1, n);
                            Ok(true.into())
                        }
                        Err(_) => Ok(false.into()),
                    }
                }),
        )
        .method(
            MethodBuilder::new("swap")
                .as_static()
                .by_ref("a", HostKind::I64)
                .by_ref("b", HostKind::I64)
                .invoke(|inv| {
                    let a = inv.arg(0).cloned().unwrap_or_default();
                    let b = inv.arg(1).cloned().unwrap_or_default();
                    inv.set(0, b);
                    inv.set(1, a);
                    Ok(HostValue::Nil)
                }),
        )
        .method(
            MethodBuilder::new("sum")
                .as_static()
                .variadic("values", HostKind::F64)
                .returns(HostKind::F64)
                .invoke(|inv| {
                    let values: Vec<f64> = inv.get(0)?;
                    Ok(values.iter().sum::<f64>().into())
                }),
        )
        .method(
            MethodBuilder::new("total")
                .as_static()
                .param("values", HostKind::array(HostKind::I64))
                .returns(HostKind::I64)
                .invoke(|inv| {
                    let values: Vec<i64> = inv.get(0)?;
                    Ok(values.iter().sum::<i64>().into())
                }),
        )
        .method(
            MethodBuilder::new("greet")
                .as_static()
                .optional("name", HostKind::Str, DefaultValue::Str("world".into()))
                .returns(HostKind::Str)
                .invoke(|inv| Ok(format!("hello, {}", inv.get::<String>(0)?).into())),
        )
        .method(
            MethodBuilder::new("cast")
                .as_static()
                .type_params(1)
                .param("value", HostKind::TypeParam(0))
                .returns(HostKind::TypeParam(0))
                .invoke(|inv| {
                    let target = inv.type_arg(0)?.name().to_string();
                    let value = inv.arg(0).cloned().unwrap_or_default();
                    Ok(vec![value, target.into()].into())
                }),
        )
        .build()
}

// ============================================================================
// geometry.Vec2: operators
// ============================================================================

pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

const VEC2: &str = "geometry.Vec2";

fn vec2_arg(inv: &Invocation<'_>, index: usize) -> HostResult<(f64, f64)> {
    let obj: HostObject = inv.get(index)?;
    let v = obj.borrow::<Vec2>()?;
    Ok((v.x, v.y))
}

fn vec2_op(name: &str) -> MethodBuilder {
    MethodBuilder::new(name)
        .as_static()
        .returns(HostKind::object(VEC2))
}

pub fn vec2_type() -> TypeDescriptor {
    ClassBuilder::new("Vec2")
        .namespace("geometry")
        .constructor(
            MethodBuilder::new("new")
                .param("x", HostKind::F64)
                .param("y", HostKind::F64)
                .invoke(|inv| {
                    let (x, y) = (inv.get::<f64>(0)?, inv.get::<f64>(1)?);
                    Ok(inv.construct(Vec2 { x, y }))
                }),
        )
        .field(FieldDef::new("x", HostKind::F64, |obj| {
            Ok(data::<Vec2>(obj)?.x.into())
        }))
        .field(FieldDef::new("y", HostKind::F64, |obj| {
            Ok(data::<Vec2>(obj)?.y.into())
        }))
        .method(
            MethodBuilder::new("length")
                .returns(HostKind::F64)
                .invoke(|inv| {
                    let v = inv.this::<Vec2>()?;
                    Ok(v.x.hypot(v.y).into())
                }),
        )
        .method(
            MethodBuilder::new("dot")
                .param("other", HostKind::object(VEC2))
                .returns(HostKind::F64)
                .invoke(|inv| {
                    let (x, y) = vec2_arg(inv, 0)?;
                    let v = inv.this::<Vec2>()?;
                    Ok((v.x * x + v.y * y).into())
                }),
        )
        .operator(
            Operator::Add,
            vec2_op("add")
                .param("a", HostKind::object(VEC2))
                .param("b", HostKind::object(VEC2))
                .invoke(|inv| {
                    let (a, b) = (vec2_arg(inv, 0)?, vec2_arg(inv, 1)?);
                    Ok(inv.construct(Vec2 {
                        x: a.0 + b.0,
                        y: a.1 + b.1,
                    }))
                }),
        )
        .operator(
            Operator::Mul,
            vec2_op("scale")
                .param("v", HostKind::object(VEC2))
                .param("k", HostKind::F64)
                .invoke(|inv| {
                    let (v, k) = (vec2_arg(inv, 0)?, inv.get::<f64>(1)?);
                    Ok(inv.construct(Vec2 {
                        x: v.0 * k,
                        y: v.1 * k,
                    }))
                }),
        )
        .operator(
            Operator::Mul,
            vec2_op("scale_left")
                .param("k", HostKind::F64)
                .param("v", HostKind::object(VEC2))
                .invoke(|inv| {
                    let (k, v) = (inv.get::<f64>(0)?, vec2_arg(inv, 1)?);
                    Ok(inv.construct(Vec2 {
                        x: v.0 * k,
                        y: v.1 * k,
                    }))
                }),
        )
        .operator(
            Operator::Neg,
            vec2_op("negate")
                .param("v", HostKind::object(VEC2))
                .invoke(|inv| {
                    let v = vec2_arg(inv, 0)?;
                    Ok(inv.construct(Vec2 { x: -v.0, y: -v.1 }))
                }),
        )
        .display(|obj| match obj.borrow::<Vec2>() {
            Ok(v) => format!("Vec2({}, {})", v.x, v.y),
            Err(_) => "Vec2(?)".to_string(),
        })
        .build()
}

// ============================================================================
// ui.Button: events
// ============================================================================

pub struct Button {
    pub label: String,
    pub clicked: EventSource,
}

pub fn button_type() -> TypeDescriptor {
    ClassBuilder::new("Button")
        .namespace("ui")
        .constructor(
            MethodBuilder::new("new")
                .param("label", HostKind::Str)
                .invoke(|inv| {
                    let label: String = inv.get(0)?;
                    Ok(inv.construct(Button {
                        label,
                        clicked: EventSource::new(),
                    }))
                }),
        )
        .field(FieldDef::new("label", HostKind::Str, |obj| {
            Ok(data::<Button>(obj)?.label.clone().into())
        }))
        .event(EventDef::new(
            "clicked",
            |obj, handler| {
                data::<Button>(obj)?.clicked.add(handler);
                Ok(())
            },
            |obj, handler| Ok(data::<Button>(obj)?.clicked.remove(handler)),
        ))
        .method(
            MethodBuilder::new("click")
                .returns(HostKind::I64)
                .invoke(|inv| {
                    let this = inv.this::<Button>()?;
                    this.clicked.emit(this.label.clone())?;
                    Ok((this.clicked.len() as i64).into())
                }),
        )
        .build()
}

// ============================================================================
// demo.Grid: indexed properties
// ============================================================================

pub struct Grid {
    pub cols: i64,
    pub cells: Vec<i64>,
}

impl Grid {
    fn slot(&self, row: i64, col: i64) -> HostResult<usize> {
        let rows = self.cells.len() as i64 / self.cols.max(1);
        if row < 1 || col < 1 || row > rows || col > self.cols {
            return Err(HostError::argument(format!("cell ({}, {}) out of range", row, col)));
        }
        Ok(((row - 1) * self.cols + (col - 1)) as usize)
    }
}

pub fn grid_type() -> TypeDescriptor {
    ClassBuilder::new("Grid")
        .namespace("demo")
        .constructor(
            MethodBuilder::new("new")
                .param("rows", HostKind::U16)
                .param("cols", HostKind::U16)
                .invoke(|inv| {
                    let (rows, cols) = (inv.get::<i64>(0)?, inv.get::<i64>(1)?);
                    Ok(inv.construct(Grid {
                        cols,
                        cells: vec![0; (rows * cols) as usize],
                    }))
                }),
        )
        .property(
            PropertyDef::new("cell", HostKind::I64)
                .indexed(vec![
                    ParamInfo::new("row", HostKind::I64),
                    ParamInfo::new("col", HostKind::I64),
                ])
                .getter(|obj, index| {
                    let grid = data::<Grid>(obj)?;
                    let slot = grid.slot(i64::from_host(&index[0])?, i64::from_host(&index[1])?)?;
                    Ok(grid.cells[slot].into())
                })
                .setter(|obj, index, value| {
                    let mut grid = data_mut::<Grid>(obj)?;
                    let slot = grid.slot(i64::from_host(&index[0])?, i64::from_host(&index[1])?)?;
                    grid.cells[slot] = i64::from_host(&value)?;
                    Ok(())
                }),
        )
        .property(
            PropertyDef::new("item", HostKind::I64)
                .indexed(vec![ParamInfo::new("index", HostKind::I64)])
                .getter(|obj, index| {
                    let grid = data::<Grid>(obj)?;
                    let i = i64::from_host(&index[0])?;
                    grid.cells
                        .get((i - 1).max(0) as usize)
                        .map(|v| HostValue::Integer(*v))
                        .ok_or_else(|| HostError::argument("index out of range"))
                }),
        )
        .build()
}

// ============================================================================
// collections.List<T>: generic type
// ============================================================================

pub struct ListData(pub Vec<HostValue>);

pub fn list_type() -> TypeDescriptor {
    ClassBuilder::new("List")
        .namespace("collections")
        .generic(&["T"], |builder, args| {
            let element = args[0].kind();
            builder
                .constructor(
                    MethodBuilder::new("new").invoke(|inv| Ok(inv.construct(ListData(Vec::new())))),
                )
                .method(
                    MethodBuilder::new("push")
                        .param("item", element.clone())
                        .invoke(|inv| {
                            let item = inv.arg(0).cloned().unwrap_or_default();
                            inv.this_mut::<ListData>()?.0.push(item);
                            Ok(HostValue::Nil)
                        }),
                )
                .method(
                    MethodBuilder::new("get")
                        .param("index", HostKind::I64)
                        .returns(element)
                        .invoke(|inv| {
                            let index: i64 = inv.get(0)?;
                            let list = inv.this::<ListData>()?;
                            list.0
                                .get((index - 1).max(0) as usize)
                                .cloned()
                                .ok_or_else(|| HostError::argument("index out of range"))
                        }),
                )
                .method(
                    MethodBuilder::new("len")
                        .returns(HostKind::I64)
                        .invoke(|inv| Ok((inv.this::<ListData>()?.0.len() as i64).into())),
                )
        })
        .build()
}

// ============================================================================
// demo.Shape / demo.Circle: inheritance; demo.Text / demo.TextExt: extensions
// ============================================================================

pub struct Circle {
    pub radius: f64,
}

pub fn shape_type() -> TypeDescriptor {
    ClassBuilder::new("Shape")
        .namespace("demo")
        .method(
            MethodBuilder::new("describe")
                .returns(HostKind::Str)
                .invoke(|inv| Ok(format!("a {}", inv.target()?.class().name()).into())),
        )
        .build()
}

pub fn circle_type(shape: &TypeDescriptor) -> TypeDescriptor {
    ClassBuilder::new("Circle")
        .namespace("demo")
        .extends(shape)
        .constructor(
            MethodBuilder::new("new")
                .param("radius", HostKind::F64)
                .invoke(|inv| {
                    let radius: f64 = inv.get(0)?;
                    Ok(inv.construct(Circle { radius }))
                }),
        )
        .method(
            MethodBuilder::new("area")
                .returns(HostKind::F64)
                .invoke(|inv| {
                    let r = inv.this::<Circle>()?.radius;
                    Ok((std::f64::consts::PI * r * r).into())
                }),
        )
        .build()
}

pub struct Text(pub String);

pub fn text_type() -> TypeDescriptor {
    ClassBuilder::new("Text")
        .namespace("demo")
        .constructor(
            MethodBuilder::new("new")
                .param("value", HostKind::Str)
                .invoke(|inv| Ok(inv.construct(Text(inv.get(0)?)))),
        )
        .method(
            MethodBuilder::new("len")
                .returns(HostKind::I64)
                .invoke(|inv| Ok((inv.this::<Text>()?.0.len() as i64).into())),
        )
        .build()
}

pub fn text_ext_type() -> TypeDescriptor {
    ClassBuilder::new("TextExt")
        .namespace("demo")
        .method(
            MethodBuilder::new("shout")
                .extension()
                .param("text", HostKind::object("demo.Text"))
                .returns(HostKind::Str)
                .invoke(|inv| {
                    let text: HostObject = inv.get(0)?;
                    let upper = text.borrow::<Text>()?.0.to_uppercase();
                    Ok(format!("{}!", upper).into())
                }),
        )
        .method(
            MethodBuilder::new("repeat_n")
                .extension()
                .param("text", HostKind::object("demo.Text"))
                .param("times", HostKind::U8)
                .returns(HostKind::Str)
                .invoke(|inv| {
                    let text: HostObject = inv.get(0)?;
                    let times: u8 = inv.get(1)?;
                    let repeated = text.borrow::<Text>()?.0.repeat(times as usize);
                    Ok(repeated.into())
                }),
        )
        .build()
}

// ============================================================================
// Setup
// ============================================================================

pub fn registry() -> Arc<TypeRegistry> {
    let shape = shape_type();
    let registry = TypeRegistry::builder()
        .register(&counter_type())
        .register(&formatter_type("Formatter", true))
        .register(&formatter_type("ReversedFormatter", false))
        .register(&vec2_type())
        .register(&button_type())
        .register(&grid_type())
        .register(&list_type())
        .register(&circle_type(&shape))
        .register(&shape)
        .register(&text_type())
        .register(&text_ext_type())
        .build();
    Arc::new(registry)
}

/// A state with every fixture namespace imported, plus `i64`, `f64` and `str`
pub fn state() -> ScriptState {
    let state = ScriptState::new(registry()).expect("create state");
    for ns in ["demo", "geometry", "ui", "collections"] {
        state.import_namespace(ns).expect("import namespace");
    }
    for prim in ["prim.i64", "prim.f64", "prim.str"] {
        state.import_type(prim).expect("import primitive");
    }
    state
}

/// Run `chunk` and return its results
pub fn eval(state: &ScriptState, chunk: &str) -> Vec<HostValue> {
    state
        .do_string(chunk, "=test")
        .unwrap_or_else(|e| panic!("script failed: {}\n{}", e, chunk))
}
